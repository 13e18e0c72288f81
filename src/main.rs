use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use dustfield::commands::log_hotkeys;
use dustfield::config::{Canvas, PerformancePreset, Settings};
use dustfield::textures::TextureConfig;

/// Interactive 2D particle field.
#[derive(Parser, Debug)]
#[command(name = "dustfield", version, about)]
struct Cli {
    /// JSON settings file; missing fields take their defaults
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Number of particles
    #[arg(short = 'n', long, conflicts_with = "preset")]
    particles: Option<usize>,

    /// Named particle count
    #[arg(short, long, value_enum)]
    preset: Option<PerformancePreset>,

    /// Window width in pixels
    #[arg(long, default_value_t = 1280)]
    width: u32,

    /// Window height in pixels
    #[arg(long, default_value_t = 720)]
    height: u32,

    /// Clear every frame instead of leaving a fading trail
    #[arg(long)]
    no_motion_blur: bool,

    /// Colour particles from this image
    #[arg(long, value_name = "PATH")]
    image: Option<PathBuf>,

    /// Increase verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
}

impl Cli {
    fn log_filter(&self) -> &'static str {
        if self.quiet {
            return "error";
        }
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }

    fn settings(&self) -> anyhow::Result<Settings> {
        let mut settings = match &self.config {
            Some(path) => Settings::from_file(path)
                .with_context(|| format!("loading settings from {}", path.display()))?,
            None => Settings::default(),
        };
        if let Some(n) = self.particles {
            settings.particles = n;
        }
        if let Some(preset) = self.preset {
            settings.particles = preset.particle_count();
        }
        if self.no_motion_blur {
            settings.render.motion_blur = false;
        }
        Ok(settings)
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(cli.log_filter())).init();

    let mut settings = cli.settings()?;
    let image = match &cli.image {
        Some(path) => {
            let image = TextureConfig::from_file(path)
                .with_context(|| format!("loading image {}", path.display()))?;
            settings.render.read_from_texture = true;
            Some(image)
        }
        None => None,
    };

    log_hotkeys();
    log::info!("starting with {} particles", settings.particles);

    let canvas = Canvas::new(cli.width as f32, cli.height as f32);
    dustfield::app::run(settings, canvas, image)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parses() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_overrides() {
        let cli = Cli::parse_from(["dustfield", "--preset", "low", "--no-motion-blur", "-vv"]);
        let settings = cli.settings().unwrap();
        assert_eq!(settings.particles, 10_000);
        assert!(!settings.render.motion_blur);
        assert_eq!(cli.log_filter(), "debug");
    }

    #[test]
    fn test_quiet() {
        let cli = Cli::parse_from(["dustfield", "-q", "-n", "500"]);
        assert_eq!(cli.log_filter(), "error");
        assert_eq!(cli.settings().unwrap().particles, 500);
    }
}
