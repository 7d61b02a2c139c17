use clap::Parser;
use img2laser::MaterialColor;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "img2laser")]
#[command(about = "Prepare images for laser engraving")]
#[command(version)]
pub struct Cli {
    /// Input image files or directories
    #[arg(short, long, num_args = 1.., required = true)]
    pub input: Vec<PathBuf>,

    /// Output PNG file, or a directory when several inputs are given
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Engraving material (wood, metal, plastic, vinyl, paper, silicone,
    /// rubber, leather, stone, screen-printing, other)
    #[arg(short, long)]
    pub material: Option<String>,

    /// Material surface tone; dark inverts the output
    #[arg(short, long)]
    pub color: Option<MaterialColor>,

    /// Laser source (co2, blue, red); unknown names mean no laser tuning
    #[arg(short, long)]
    pub laser: Option<String>,

    /// Gamma to use instead of the recommended one (0.1-3.0)
    #[arg(short, long)]
    pub gamma: Option<f64>,

    /// TOML configuration file; flags override its values
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Print the analysis report as JSON
    #[arg(short, long)]
    pub report: bool,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}
