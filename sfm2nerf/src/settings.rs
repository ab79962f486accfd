use serde::{Deserialize, Serialize};

/// The settings for pose normalization.
///
/// Every field may be left out of a settings file, in which case its default is used.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizeSettings {
    /// The mean distance of the cameras from the scene center after scale normalization
    #[serde(default = "default_target_mean_distance")]
    pub target_mean_distance: f64,
    /// The weight a ray pair must exceed to contribute to the scene center
    #[serde(default = "default_minimum_pair_weight")]
    pub minimum_pair_weight: f64,
    /// Guards the rotation and ray-pair denominators and the zero-length up sum
    #[serde(default = "default_epsilon")]
    pub epsilon: f64,
    /// The bounding box scale written to the dataset for the trainer
    #[serde(default = "default_aabb_scale")]
    pub aabb_scale: u32,
}

impl Default for NormalizeSettings {
    fn default() -> Self {
        Self {
            target_mean_distance: default_target_mean_distance(),
            minimum_pair_weight: default_minimum_pair_weight(),
            epsilon: default_epsilon(),
            aabb_scale: default_aabb_scale(),
        }
    }
}

fn default_target_mean_distance() -> f64 {
    4.0
}

fn default_minimum_pair_weight() -> f64 {
    0.01
}

fn default_epsilon() -> f64 {
    1e-10
}

fn default_aabb_scale() -> u32 {
    16
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let settings: NormalizeSettings =
            serde_json::from_str(r#"{"target_mean_distance": 2.5}"#).unwrap();
        assert_eq!(settings.target_mean_distance, 2.5);
        assert_eq!(settings.minimum_pair_weight, 0.01);
        assert_eq!(settings.epsilon, 1e-10);
        assert_eq!(settings.aabb_scale, 16);
    }

    #[test]
    fn empty_file_is_default() {
        let settings: NormalizeSettings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings, NormalizeSettings::default());
    }
}
