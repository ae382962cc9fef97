#![forbid(unsafe_code)]

// SensorId is assigned by the pipeline config and stable for the process lifetime
// repr(transparent) -> same layout as the wrapped u16
#[repr(transparent)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct SensorId(pub u16);

/// Number of samples carried by one frame.
pub const FRAME_SAMPLES: usize = 8;

// One acquisition from a sensor. POD, fixed-size, lives in place inside a ring slot
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SensorFrame {
    pub seq: u64,   // producer sequence number, starts at 0
    pub ts_ns: u64, // capture timestamp, nanoseconds since the unix epoch
    pub sensor_id: SensorId,
    pub samples: [i32; FRAME_SAMPLES],
}

// A zeroed sample array would fail `is_consistent`, so default to frame 0
impl Default for SensorFrame {
    fn default() -> Self {
        Self::new(0, 0, SensorId::default())
    }
}

impl SensorFrame {
    /// Builds a frame whose samples are a deterministic function of `seq`.
    pub fn new(seq: u64, ts_ns: u64, sensor_id: SensorId) -> Self {
        Self {
            seq,
            ts_ns,
            sensor_id,
            samples: Self::expected_samples(seq),
        }
    }

    /// Overwrites this frame in place, as a producer does through a write guard.
    #[inline]
    pub fn fill(&mut self, seq: u64, ts_ns: u64, sensor_id: SensorId) {
        self.seq = seq;
        self.ts_ns = ts_ns;
        self.sensor_id = sensor_id;
        self.samples = Self::expected_samples(seq);
    }

    #[inline]
    pub fn checksum(&self) -> i64 {
        self.samples
            .iter()
            .fold(self.seq as i64, |acc, &s| acc.wrapping_mul(31).wrapping_add(s as i64))
    }

    /// True when the samples match the sequence number, i.e. the frame was
    /// not observed halfway through a rewrite.
    #[inline]
    pub fn is_consistent(&self) -> bool {
        self.samples == Self::expected_samples(self.seq)
    }

    fn expected_samples(seq: u64) -> [i32; FRAME_SAMPLES] {
        std::array::from_fn(|k| (seq as i32).wrapping_mul(31).wrapping_add(k as i32))
    }
}
