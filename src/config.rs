//! Configuration for a particle-text scene.
//!
//! Every option has a default, so a config file only needs the fields it
//! changes. Saved and loaded as JSON.

use std::fs;
use std::path::{Path, PathBuf};

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::visuals::Color;

fn default_particle_size() -> f32 {
    2.0
}

fn default_font_size() -> f32 {
    30.0
}

fn default_background() -> Color {
    Color::TRANSPARENT
}

/// Options recognized by the particle text scene.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ParticleTextConfig {
    /// Text handed to the rasterizer.
    #[serde(default)]
    pub text: String,
    /// Particle radius in pixels; also scales the default particle count.
    #[serde(default = "default_particle_size")]
    pub particle_size: f32,
    /// Target particle count. Derived from canvas area when absent or zero.
    #[serde(default)]
    pub num_particles: Option<u32>,
    #[serde(default = "default_font_size")]
    pub font_size: f32,
    /// Filled before every frame.
    #[serde(default = "default_background")]
    pub background_color: Color,
    /// Fill color of every particle.
    #[serde(default)]
    pub color: Color,
    /// Interaction radius and grid cell size. Defaults to `font_size / 3`.
    #[serde(default)]
    pub mouse_radius: Option<f32>,
    /// Font file for the rasterizer.
    #[serde(default)]
    pub font: Option<PathBuf>,
}

impl Default for ParticleTextConfig {
    fn default() -> Self {
        Self {
            text: String::new(),
            particle_size: default_particle_size(),
            num_particles: None,
            font_size: default_font_size(),
            background_color: default_background(),
            color: Color::BLACK,
            mouse_radius: None,
            font: None,
        }
    }
}

impl ParticleTextConfig {
    /// The pointer's reach, which is also the spatial grid's cell size.
    pub fn interaction_radius(&self) -> f32 {
        self.mouse_radius.unwrap_or(self.font_size / 3.0)
    }

    /// Margin around the text on each side: half the font size.
    pub fn padding(&self) -> Vec2 {
        Vec2::splat(self.font_size / 2.0)
    }

    /// Target count with zero treated as "not given".
    pub fn target_particles(&self) -> Option<u32> {
        self.num_particles.filter(|&n| n > 0)
    }

    /// Reject sizes that would leave the grid or the area scaling undefined.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_positive("particle_size", self.particle_size)?;
        check_positive("font_size", self.font_size)?;
        if let Some(radius) = self.mouse_radius {
            check_positive("mouse_radius", radius)?;
        }
        Ok(())
    }

    /// Save the configuration as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Load and validate a configuration from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&json)?;
        config.validate()?;
        Ok(config)
    }
}

fn check_positive(name: &str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid(format!(
            "{} must be a positive number, got {}",
            name, value
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ParticleTextConfig::default();
        assert_eq!(config.particle_size, 2.0);
        assert_eq!(config.font_size, 30.0);
        assert_eq!(config.interaction_radius(), 10.0);
        assert_eq!(config.padding(), Vec2::splat(15.0));
        assert_eq!(config.background_color, Color::TRANSPARENT);
        assert_eq!(config.color, Color::BLACK);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_explicit_mouse_radius_wins() {
        let config = ParticleTextConfig {
            mouse_radius: Some(25.0),
            ..Default::default()
        };
        assert_eq!(config.interaction_radius(), 25.0);
    }

    #[test]
    fn test_zero_particles_means_absent() {
        let mut config = ParticleTextConfig {
            num_particles: Some(0),
            ..Default::default()
        };
        assert_eq!(config.target_particles(), None);
        config.num_particles = Some(40);
        assert_eq!(config.target_particles(), Some(40));
    }

    #[test]
    fn test_validate_rejects_bad_sizes() {
        let bad = [
            ParticleTextConfig { particle_size: 0.0, ..Default::default() },
            ParticleTextConfig { font_size: -3.0, ..Default::default() },
            ParticleTextConfig { mouse_radius: Some(f32::NAN), ..Default::default() },
        ];
        for config in bad {
            assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
        }
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: ParticleTextConfig =
            serde_json::from_str(r##"{ "text": "Hi", "color": "#ff0000" }"##).unwrap();
        assert_eq!(config.text, "Hi");
        assert_eq!(config.color, Color::rgb(255, 0, 0));
        assert_eq!(config.font_size, 30.0);
        assert_eq!(config.num_particles, None);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scene.json");
        let config = ParticleTextConfig {
            text: "glyphs".into(),
            num_particles: Some(500),
            background_color: Color::WHITE,
            ..Default::default()
        };
        config.save(&path).unwrap();
        assert_eq!(ParticleTextConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, r#"{ "particle_size": 0 }"#).unwrap();
        assert!(matches!(
            ParticleTextConfig::load(&path),
            Err(ConfigError::Invalid(_))
        ));

        fs::write(&path, "not json").unwrap();
        assert!(matches!(ParticleTextConfig::load(&path), Err(ConfigError::Json(_))));
    }
}
