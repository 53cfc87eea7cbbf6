use crate::catalog::ItemCatalog;
use crate::config::{ConfigError, GameConfig};
use crate::flight::{FlightSession, FlightSignal, Pickup};
use crate::session_record::SessionRecord;
use crate::shop::{ShopError, Upgrades};
use crate::spawner::{SpawnOutcome, Spawner};
use crate::types::{GameEvent, RunEnd, Snapshot, UpgradeKind, Vec3};
use crate::wallet::Wallet;

/// Owns every piece of game state; callers pass it around explicitly.
///
/// State changes are queued as [`GameEvent`]s in emission order and handed
/// out once by [`GameContext::snapshot`] with `include_events = true`.
#[derive(Clone, Debug)]
pub struct GameContext {
    config: GameConfig,
    spawner: Spawner,
    flight: FlightSession,
    wallet: Wallet,
    upgrades: Upgrades,
    record: SessionRecord,
    events: Vec<GameEvent>,
    tick_counter: u64,
}

impl GameContext {
    pub fn new(config: GameConfig, record: SessionRecord, seed: u32) -> Result<Self, ConfigError> {
        config.validate()?;
        let upgrades = Upgrades::default();
        let catalog = ItemCatalog::new(&config.items);
        if catalog.is_empty() {
            log::warn!("[game] item catalog is empty; no items will spawn");
        } else {
            log::debug!("[game] {} item definitions loaded", catalog.len());
        }
        let spawner = Spawner::new(config.spawner.clone(), catalog, seed);
        let flight = FlightSession::new(upgrades.flight_stats(&config.flight));
        let mut context = Self {
            config,
            spawner,
            flight,
            wallet: Wallet::default(),
            upgrades,
            record,
            events: Vec::new(),
            tick_counter: 0,
        };
        context.reset_spawner();
        Ok(context)
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn spawner(&self) -> &Spawner {
        &self.spawner
    }

    pub fn flight(&self) -> &FlightSession {
        &self.flight
    }

    pub fn wallet(&self) -> &Wallet {
        &self.wallet
    }

    pub fn upgrades(&self) -> &Upgrades {
        &self.upgrades
    }

    pub fn record(&self) -> &SessionRecord {
        &self.record
    }

    /// Clears the best height and run count; wallet and upgrades are kept.
    pub fn reset_record(&mut self) {
        self.record.reset();
    }

    pub fn into_record(self) -> SessionRecord {
        self.record
    }

    pub fn is_run_over(&self) -> bool {
        self.flight.is_ended()
    }

    pub fn tick(&self) -> u64 {
        self.tick_counter
    }

    /// Re-derives the whole placement set around the spawner's anchor.
    pub fn reset_spawner(&mut self) -> usize {
        let placed = self.spawner.reset_spawner().len();
        self.events.push(GameEvent::SpawnerReset { placed });
        placed
    }

    pub fn step(&mut self, dt_ms: u64, thrusting: bool) {
        if self.flight.is_ended() {
            return;
        }
        self.tick_counter += 1;
        let signals = self.flight.step(dt_ms, thrusting);
        self.handle_signals(signals);

        let anchor = self.rocket_anchor();
        self.spawner.recentre(anchor);
        self.spawner.retire_below(self.flight.height());
        if self.flight.is_ended() {
            return;
        }
        let live_items = self.spawner.live_count();
        let outcome = self.spawner.tick(dt_ms, live_items);
        if let Some(placement) = outcome.as_ref().and_then(SpawnOutcome::placement) {
            self.events.push(GameEvent::ItemSpawned {
                item_id: placement.id,
                category: placement.category,
            });
        }
    }

    pub fn steer_towards(&mut self, target_x: f32, dt_ms: u64) {
        self.flight.steer_towards(target_x, dt_ms);
    }

    pub fn collect(&mut self, item_id: u64) -> Option<Pickup> {
        if self.flight.is_ended() {
            return None;
        }
        let placement = self.spawner.collect(item_id)?;
        let pickup = self.flight.apply_pickup(&placement.item);
        self.events.push(GameEvent::ItemCollected {
            item_id,
            category: placement.category,
            amount: placement.item.amount,
        });
        if let Pickup::Bank { category, amount } = pickup {
            if self.wallet.deposit(category, amount) {
                self.push_wallet_changed();
            }
        }
        Some(pickup)
    }

    /// Collects every item within the pickup radius of the rocket, measured
    /// on the lateral and height axes. Returns the collected ids.
    pub fn collect_in_reach(&mut self) -> Vec<u64> {
        let radius = self.config.flight.pickup_radius;
        let (x, height) = (self.flight.x(), self.flight.height());
        let in_reach: Vec<u64> = self
            .spawner
            .placements()
            .filter(|placement| {
                let dx = placement.position.x - x;
                let dy = placement.position.y - height;
                dx * dx + dy * dy <= radius * radius
            })
            .map(|placement| placement.id)
            .collect();
        in_reach
            .into_iter()
            .filter(|id| self.collect(*id).is_some())
            .collect()
    }

    pub fn crash(&mut self) {
        if let Some(signal) = self.flight.crash() {
            self.handle_signals(vec![signal]);
        }
    }

    /// Buys one level now; flight and spawn effects apply from the next run.
    pub fn purchase(&mut self, kind: UpgradeKind) -> Result<u8, ShopError> {
        let level = self
            .upgrades
            .purchase(kind, &mut self.wallet, &self.config.shop)?;
        self.events.push(GameEvent::UpgradePurchased { kind, level });
        self.push_wallet_changed();
        Ok(level)
    }

    /// Starts a fresh run with current upgrades. A run abandoned before it
    /// ended is not counted in the session record.
    pub fn restart(&mut self) {
        self.flight = FlightSession::new(self.upgrades.flight_stats(&self.config.flight));
        self.spawner
            .set_weights(self.upgrades.spawn_weights(self.config.spawner.weights));
        let anchor = self.rocket_anchor();
        self.spawner.recentre(anchor);
        self.tick_counter = 0;
        self.reset_spawner();
    }

    pub fn snapshot(&mut self, include_events: bool) -> Snapshot {
        let events = if include_events {
            std::mem::take(&mut self.events)
        } else {
            Vec::new()
        };
        Snapshot {
            tick: self.tick_counter,
            elapsed_ms: self.flight.elapsed_ms(),
            height: self.flight.height(),
            x: self.flight.x(),
            fuel: self.flight.fuel(),
            fuel_capacity: self.flight.stats().fuel_capacity,
            live_items: self.spawner.live_count(),
            best_height: self.record.best_height,
            gold: self.wallet.gold,
            metal: self.wallet.metal,
            energy: self.wallet.energy,
            run_end: self.flight.end(),
            events,
        }
    }

    fn rocket_anchor(&self) -> Vec3 {
        Vec3::new(
            self.flight.x(),
            self.flight.height(),
            self.config.spawner.reference_depth,
        )
    }

    fn handle_signals(&mut self, signals: Vec<FlightSignal>) {
        for signal in signals {
            match signal {
                FlightSignal::FuelLow { fuel } => self.events.push(GameEvent::FuelLow { fuel }),
                FlightSignal::Ended { reason, height } => self.finish_run(reason, height),
            }
        }
    }

    fn finish_run(&mut self, reason: RunEnd, height: f32) {
        self.events.push(GameEvent::RunEnded { reason, height });
        if self.record.finish_run(height) {
            self.events.push(GameEvent::NewBestHeight { height });
        }
    }

    fn push_wallet_changed(&mut self) {
        self.events.push(GameEvent::WalletChanged {
            gold: self.wallet.gold,
            metal: self.wallet.metal,
            energy: self.wallet.energy,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ItemCategory, ItemDefinition};

    fn make_context(seed: u32) -> GameContext {
        GameContext::new(GameConfig::default(), SessionRecord::default(), seed)
            .expect("default config is valid")
    }

    fn first_item_of(context: &GameContext, category: ItemCategory) -> u64 {
        context
            .spawner()
            .placements()
            .find(|placement| placement.category == category)
            .map(|placement| placement.id)
            .expect("category present")
    }

    #[test]
    fn new_context_populates_and_reports_reset() {
        let mut context = make_context(1);
        let expected = GameConfig::default().spawner.initial_count;
        assert_eq!(context.spawner().live_count(), expected);
        let snapshot = context.snapshot(true);
        assert_eq!(snapshot.events, vec![GameEvent::SpawnerReset { placed: expected }]);
        assert!(context.snapshot(true).events.is_empty());
    }

    #[test]
    fn snapshot_without_events_keeps_queue() {
        let mut context = make_context(1);
        assert!(context.snapshot(false).events.is_empty());
        assert_eq!(context.snapshot(true).events.len(), 1);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut config = GameConfig::default();
        config.spawner.spacing = -1.0;
        assert!(GameContext::new(config, SessionRecord::default(), 1).is_err());
    }

    #[test]
    fn collecting_gold_banks_it_in_order() {
        let mut context = make_context(3);
        context.snapshot(true);
        let id = first_item_of(&context, ItemCategory::Gold);
        let pickup = context.collect(id).expect("collected");
        assert!(matches!(pickup, Pickup::Bank { category: ItemCategory::Gold, .. }));
        assert!(context.collect(id).is_none());
        let events = context.snapshot(true).events;
        assert!(matches!(events[0], GameEvent::ItemCollected { item_id, .. } if item_id == id));
        assert!(matches!(events[1], GameEvent::WalletChanged { gold, .. } if gold > 0));
    }

    #[test]
    fn collecting_fuel_refills_without_banking() {
        let mut context = make_context(3);
        for _ in 0..20 {
            context.step(100, true);
        }
        let before = context.flight().fuel();
        context.snapshot(true);
        let id = first_item_of(&context, ItemCategory::Fuel);
        assert!(matches!(context.collect(id), Some(Pickup::Refueled { .. })));
        assert!(context.flight().fuel() > before);
        assert_eq!(*context.wallet(), Wallet::default());
        let events = context.snapshot(true).events;
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn step_recentres_spawner_on_rocket() {
        let mut context = make_context(5);
        for _ in 0..10 {
            context.step(100, true);
        }
        let anchor = context.spawner().anchor();
        assert_eq!(anchor.y, context.flight().height());
        assert!(context
            .spawner()
            .placements()
            .all(|placement| placement.position.y >= context.flight().height()));
    }

    #[test]
    fn crash_finishes_run_and_sets_record() {
        let mut context = make_context(7);
        for _ in 0..20 {
            context.step(100, true);
        }
        context.snapshot(true);
        context.crash();
        assert!(context.is_run_over());
        let events = context.snapshot(true).events;
        assert!(matches!(
            events[0],
            GameEvent::RunEnded {
                reason: RunEnd::Crashed,
                ..
            }
        ));
        assert!(matches!(events[1], GameEvent::NewBestHeight { .. }));
        assert_eq!(context.record().runs, 1);
        assert!(context.record().best_height > 0.0);

        let tick = context.tick();
        context.step(100, true);
        assert_eq!(context.tick(), tick);
    }

    #[test]
    fn running_dry_ends_run() {
        let mut context = make_context(9);
        let mut guard = 0;
        while !context.is_run_over() {
            context.step(100, true);
            guard += 1;
            assert!(guard < 10_000);
        }
        assert_eq!(context.flight().end(), Some(RunEnd::OutOfFuel));
        let events = context.snapshot(true).events;
        assert!(events
            .iter()
            .any(|event| matches!(event, GameEvent::FuelLow { .. })));
    }

    #[test]
    fn restart_applies_upgrades_and_keeps_record() {
        let mut config = GameConfig::default();
        config.items = vec![ItemDefinition {
            category: ItemCategory::Gold,
            amount: 1_000,
        }];
        config.spawner.weights = crate::spawner::CategoryWeights {
            gold: 1.0,
            fuel: 0.0,
            energy: 0.0,
            metal: 0.0,
        };
        config.shop.fuel_tank.metal = 0;
        config.shop.gold_magnet.energy = 0;
        let mut context = GameContext::new(config, SessionRecord::default(), 11).expect("valid");
        let id = first_item_of(&context, ItemCategory::Gold);
        context.collect(id);
        context.step(1_000, true);
        context.crash();
        let best = context.record().best_height;

        assert_eq!(context.purchase(UpgradeKind::FuelTank), Ok(1));
        assert_eq!(context.purchase(UpgradeKind::GoldMagnet), Ok(1));
        context.restart();

        assert!(!context.is_run_over());
        assert_eq!(context.flight().height(), 0.0);
        assert!(context.flight().fuel() > GameConfig::default().flight.fuel_capacity);
        assert!((context.spawner().weights().gold - 1.25).abs() < 1e-9);
        assert_eq!(context.record().best_height, best);
        assert_eq!(
            context.spawner().live_count(),
            GameConfig::default().spawner.initial_count
        );
    }

    #[test]
    fn purchase_failure_emits_nothing() {
        let mut context = make_context(2);
        context.snapshot(true);
        assert!(context.purchase(UpgradeKind::Engine).is_err());
        assert!(context.snapshot(true).events.is_empty());
    }

    #[test]
    fn collect_in_reach_picks_nearby_items_only() {
        let mut config = GameConfig::default();
        config.spawner.min_height = 0.0;
        config.spawner.max_height = 0.0;
        config.flight.pickup_radius = 30.0;
        let mut context = GameContext::new(config, SessionRecord::default(), 13).expect("valid");
        let nearby: Vec<u64> = context
            .spawner()
            .placements()
            .filter(|placement| placement.position.x.abs() <= 30.0)
            .map(|placement| placement.id)
            .collect();
        let mut collected = context.collect_in_reach();
        collected.sort_unstable();
        let mut expected = nearby;
        expected.sort_unstable();
        assert_eq!(collected, expected);
    }

    #[test]
    fn record_is_passed_in_and_out() {
        let record = SessionRecord {
            best_height: 999.0,
            runs: 3,
            best_recorded_at: None,
        };
        let mut context = GameContext::new(GameConfig::default(), record.clone(), 1).expect("valid");
        context.crash();
        let record_after = context.into_record();
        assert_eq!(record_after.best_height, 999.0);
        assert_eq!(record_after.runs, 4);
    }

    #[test]
    fn reset_record_clears_best_height_only() {
        let record = SessionRecord {
            best_height: 120.0,
            runs: 2,
            best_recorded_at: None,
        };
        let mut context = GameContext::new(GameConfig::default(), record, 1).expect("valid");
        let id = first_item_of(&context, ItemCategory::Gold);
        context.collect(id);
        let wallet = *context.wallet();

        context.reset_record();
        assert_eq!(context.record().best_height, 0.0);
        assert_eq!(context.record().runs, 0);
        assert_eq!(*context.wallet(), wallet);

        context.step(1_000, true);
        context.crash();
        assert_eq!(context.record().runs, 1);
        assert!(context.record().best_height > 0.0);
    }

    #[test]
    fn empty_catalog_spawns_nothing() {
        let mut config = GameConfig::default();
        config.items.clear();
        let mut context = GameContext::new(config, SessionRecord::default(), 6).expect("valid");
        assert_eq!(context.spawner().live_count(), 0);
        assert_eq!(context.spawner().occupied_count(), 0);
        for _ in 0..20 {
            context.step(100, false);
        }
        assert_eq!(context.spawner().live_count(), 0);
    }

    #[test]
    fn negative_lateral_speed_is_rejected_before_steering() {
        let mut config = GameConfig::default();
        config.flight.lateral_per_sec = -10.0;
        assert!(GameContext::new(config, SessionRecord::default(), 1).is_err());
    }

    #[test]
    fn oversized_grid_is_rejected_before_populate() {
        let mut config = GameConfig::default();
        config.spawner.radius = 1e6;
        config.spawner.spacing = 0.01;
        assert!(matches!(
            GameContext::new(config, SessionRecord::default(), 1),
            Err(ConfigError::Invalid {
                field: "spawner.spacing",
                ..
            })
        ));
    }
}
