// ── Fixed sensor and flow-meter positions ──
//
// The firmware reports temperatures and flow counts as plain arrays. The
// meaning of each position is a fixed contract; these enums name the
// positions so nothing downstream indexes a raw array.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, IntoStaticStr};

/// Number of temperature slots the contract defines (six process sensors
/// plus up to two fermentation vessels).
pub const SENSOR_SLOTS: usize = 8;

/// Role of a temperature sensor, by its position in `temp[]`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SensorRole {
    Head,
    Plate,
    Middle,
    Base,
    Tails,
    Steam,
    Ferment1,
    Ferment2,
}

impl SensorRole {
    /// Position in the device's `temp[]` array.
    pub fn index(self) -> usize {
        match self {
            Self::Head => 0,
            Self::Plate => 1,
            Self::Middle => 2,
            Self::Base => 3,
            Self::Tails => 4,
            Self::Steam => 5,
            Self::Ferment1 => 6,
            Self::Ferment2 => 7,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::Head),
            1 => Some(Self::Plate),
            2 => Some(Self::Middle),
            3 => Some(Self::Base),
            4 => Some(Self::Tails),
            5 => Some(Self::Steam),
            6 => Some(Self::Ferment1),
            7 => Some(Self::Ferment2),
            _ => None,
        }
    }

    /// Human label for readouts.
    pub fn label(self) -> &'static str {
        match self {
            Self::Head => "Head",
            Self::Plate => "Plate",
            Self::Middle => "Middle",
            Self::Base => "Base",
            Self::Tails => "Tails",
            Self::Steam => "Steam",
            Self::Ferment1 => "Ferment 1",
            Self::Ferment2 => "Ferment 2",
        }
    }
}

/// A flow meter, by its position in `flows[]`.
///
/// Position 2 exists on the wire but has no readout.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FlowMeter {
    Still,
    Water,
    Ferment,
}

impl FlowMeter {
    pub fn index(self) -> usize {
        match self {
            Self::Still => 0,
            Self::Water => 1,
            Self::Ferment => 3,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Still => "Still",
            Self::Water => "Water",
            Self::Ferment => "Ferment",
        }
    }
}

/// A fixed-size array of optional readings indexed by [`SensorRole`].
///
/// Built from a device array of any length: short arrays leave trailing
/// roles empty, extra elements are ignored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorArray<T> {
    slots: [Option<T>; SENSOR_SLOTS],
}

impl<T: Copy> SensorArray<T> {
    pub fn from_slice(values: &[Option<T>]) -> Self {
        let mut slots = [None; SENSOR_SLOTS];
        for (slot, value) in slots.iter_mut().zip(values) {
            *slot = *value;
        }
        Self { slots }
    }

    pub fn get(&self, role: SensorRole) -> Option<T> {
        self.slots.get(role.index()).copied().flatten()
    }
}

impl<T: Copy> Default for SensorArray<T> {
    fn default() -> Self {
        Self {
            slots: [None; SENSOR_SLOTS],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn role_indices_round_trip() {
        for role in SensorRole::iter() {
            assert_eq!(SensorRole::from_index(role.index()), Some(role));
        }
        assert_eq!(SensorRole::from_index(SENSOR_SLOTS), None);
    }

    #[test]
    fn short_array_leaves_trailing_roles_empty() {
        let arr = SensorArray::from_slice(&[Some(70.0), None, Some(55.5)]);
        assert_eq!(arr.get(SensorRole::Head), Some(70.0));
        assert_eq!(arr.get(SensorRole::Plate), None);
        assert_eq!(arr.get(SensorRole::Middle), Some(55.5));
        assert_eq!(arr.get(SensorRole::Steam), None);
        assert_eq!(arr.get(SensorRole::Ferment2), None);
    }

    #[test]
    fn long_array_is_truncated() {
        let values: Vec<Option<f64>> = (0..12).map(|i| Some(f64::from(i))).collect();
        let arr = SensorArray::from_slice(&values);
        assert_eq!(arr.get(SensorRole::Ferment2), Some(7.0));
    }

    #[test]
    fn ferment_flow_skips_position_two() {
        assert_eq!(FlowMeter::Ferment.index(), 3);
        assert_eq!(FlowMeter::Ferment.to_string(), "ferment");
    }
}
