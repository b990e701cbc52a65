//! Static checkpoint ladder
//!
//! Every tracked pool is sampled at 22 fixed offsets from its discovery
//! time: every 5 minutes from 10 to 60 minutes, then hourly to 12 hours.
//! Adding or removing a checkpoint is a change to this table, nothing else.

/// Pacing class for external-call budgeting.
///
/// When many pools become due at once, hour-granularity checkpoints carry
/// the longest pre-fetch delay, the 60-minute checkpoint a shorter one, and
/// the sub-hour checkpoints none.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacingClass {
    SubHour,
    FinalMinute,
    Hourly,
}

/// One time-gated observation point on the ladder
#[derive(Debug, Clone, Copy)]
pub struct Checkpoint {
    /// Column name in the dataset, e.g. "price_10m"
    pub name: &'static str,
    /// Due-time offset from discovery, in seconds
    pub offset_secs: u64,
}

impl Checkpoint {
    const fn new(name: &'static str, offset_secs: u64) -> Self {
        Self { name, offset_secs }
    }

    /// Pacing class of this checkpoint
    pub fn pacing_class(&self) -> PacingClass {
        if self.offset_secs > 3600 {
            PacingClass::Hourly
        } else if self.offset_secs == 3600 {
            PacingClass::FinalMinute
        } else {
            PacingClass::SubHour
        }
    }
}

/// Number of checkpoints on the ladder
pub const CHECKPOINT_COUNT: usize = 22;

/// The ladder, in ascending due-time order
pub const CHECKPOINTS: [Checkpoint; CHECKPOINT_COUNT] = [
    Checkpoint::new("price_10m", 600),
    Checkpoint::new("price_15m", 900),
    Checkpoint::new("price_20m", 1200),
    Checkpoint::new("price_25m", 1500),
    Checkpoint::new("price_30m", 1800),
    Checkpoint::new("price_35m", 2100),
    Checkpoint::new("price_40m", 2400),
    Checkpoint::new("price_45m", 2700),
    Checkpoint::new("price_50m", 3000),
    Checkpoint::new("price_55m", 3300),
    Checkpoint::new("price_60m", 3600),
    Checkpoint::new("price_2h", 7200),
    Checkpoint::new("price_3h", 10800),
    Checkpoint::new("price_4h", 14400),
    Checkpoint::new("price_5h", 18000),
    Checkpoint::new("price_6h", 21600),
    Checkpoint::new("price_7h", 25200),
    Checkpoint::new("price_8h", 28800),
    Checkpoint::new("price_9h", 32400),
    Checkpoint::new("price_10h", 36000),
    Checkpoint::new("price_11h", 39600),
    Checkpoint::new("price_12h", 43200),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offsets_strictly_increasing() {
        for pair in CHECKPOINTS.windows(2) {
            assert!(
                pair[0].offset_secs < pair[1].offset_secs,
                "{} must come before {}",
                pair[0].name,
                pair[1].name
            );
        }
    }

    #[test]
    fn test_ladder_endpoints() {
        assert_eq!(CHECKPOINTS[0].name, "price_10m");
        assert_eq!(CHECKPOINTS[0].offset_secs, 600);
        assert_eq!(CHECKPOINTS[CHECKPOINT_COUNT - 1].name, "price_12h");
        assert_eq!(CHECKPOINTS[CHECKPOINT_COUNT - 1].offset_secs, 43200);
    }

    #[test]
    fn test_pacing_classes() {
        let by_name = |name: &str| {
            CHECKPOINTS
                .iter()
                .find(|c| c.name == name)
                .expect("checkpoint exists")
        };
        assert_eq!(by_name("price_10m").pacing_class(), PacingClass::SubHour);
        assert_eq!(by_name("price_55m").pacing_class(), PacingClass::SubHour);
        assert_eq!(
            by_name("price_60m").pacing_class(),
            PacingClass::FinalMinute
        );
        assert_eq!(by_name("price_2h").pacing_class(), PacingClass::Hourly);
        assert_eq!(by_name("price_12h").pacing_class(), PacingClass::Hourly);
    }

    #[test]
    fn test_hourly_class_count() {
        let hourly = CHECKPOINTS
            .iter()
            .filter(|c| c.pacing_class() == PacingClass::Hourly)
            .count();
        assert_eq!(hourly, 11);
    }
}
