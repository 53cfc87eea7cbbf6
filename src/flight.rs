use crate::types::{ItemCategory, ItemDefinition, RunEnd};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FlightStats {
    pub fuel_capacity: f32,
    pub burn_per_sec: f32,
    pub climb_per_sec: f32,
    pub lateral_per_sec: f32,
    pub low_fuel_ratio: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Pickup {
    Refueled { added: f32 },
    /// Resource to bank in the wallet.
    Bank { category: ItemCategory, amount: u32 },
    /// Run already over; nothing applied.
    Ignored,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FlightSignal {
    FuelLow { fuel: f32 },
    Ended { reason: RunEnd, height: f32 },
}

#[derive(Clone, Debug)]
pub struct FlightSession {
    stats: FlightStats,
    height: f32,
    x: f32,
    fuel: f32,
    elapsed_ms: u64,
    low_fuel_warned: bool,
    end: Option<RunEnd>,
}

impl FlightSession {
    pub fn new(stats: FlightStats) -> Self {
        Self {
            stats,
            height: 0.0,
            x: 0.0,
            fuel: stats.fuel_capacity,
            elapsed_ms: 0,
            low_fuel_warned: false,
            end: None,
        }
    }

    pub fn stats(&self) -> &FlightStats {
        &self.stats
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn x(&self) -> f32 {
        self.x
    }

    pub fn fuel(&self) -> f32 {
        self.fuel
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ms
    }

    pub fn end(&self) -> Option<RunEnd> {
        self.end
    }

    pub fn is_ended(&self) -> bool {
        self.end.is_some()
    }

    pub fn step(&mut self, dt_ms: u64, thrusting: bool) -> Vec<FlightSignal> {
        let mut signals = Vec::new();
        if self.is_ended() {
            return signals;
        }
        self.elapsed_ms = self.elapsed_ms.saturating_add(dt_ms);
        if !thrusting {
            return signals;
        }

        let dt = dt_ms as f32 / 1000.0;
        let burn = self.stats.burn_per_sec * dt;
        // only the fraction of the frame the remaining fuel covers counts
        let powered = if burn > 0.0 {
            (self.fuel / burn).min(1.0)
        } else {
            1.0
        };
        self.fuel = (self.fuel - burn).max(0.0);
        self.height += self.stats.climb_per_sec * dt * powered;

        if !self.low_fuel_warned
            && self.fuel > 0.0
            && self.fuel <= self.stats.fuel_capacity * self.stats.low_fuel_ratio
        {
            self.low_fuel_warned = true;
            signals.push(FlightSignal::FuelLow { fuel: self.fuel });
        }
        if self.fuel <= 0.0 {
            signals.push(self.finish(RunEnd::OutOfFuel));
        }
        signals
    }

    /// Moves laterally towards `target_x`, capped by the lateral speed.
    pub fn steer_towards(&mut self, target_x: f32, dt_ms: u64) {
        if self.is_ended() {
            return;
        }
        let max_step = (self.stats.lateral_per_sec * dt_ms as f32 / 1000.0).max(0.0);
        let delta = (target_x - self.x).clamp(-max_step, max_step);
        self.x += delta;
    }

    pub fn apply_pickup(&mut self, item: &ItemDefinition) -> Pickup {
        if self.is_ended() {
            return Pickup::Ignored;
        }
        match item.category {
            ItemCategory::Fuel => {
                let before = self.fuel;
                self.fuel = (self.fuel + item.amount as f32).min(self.stats.fuel_capacity);
                if self.fuel > self.stats.fuel_capacity * self.stats.low_fuel_ratio {
                    self.low_fuel_warned = false;
                }
                Pickup::Refueled {
                    added: self.fuel - before,
                }
            }
            category => Pickup::Bank {
                category,
                amount: item.amount,
            },
        }
    }

    pub fn crash(&mut self) -> Option<FlightSignal> {
        if self.is_ended() {
            return None;
        }
        Some(self.finish(RunEnd::Crashed))
    }

    fn finish(&mut self, reason: RunEnd) -> FlightSignal {
        self.end = Some(reason);
        log::info!(
            "[flight] run ended ({reason:?}) at height {:.1} after {} ms",
            self.height,
            self.elapsed_ms
        );
        FlightSignal::Ended {
            reason,
            height: self.height,
        }
    }
}
