use anyhow::Result;
use astrocam_core::stack::{compute_snr_improvement, SigmaClipParams, StackMethod};
use clap::Args;
use console::Style;

#[derive(Args)]
pub struct SnrArgs {
    /// Largest frame count in the table
    #[arg(short = 'n', long, default_value = "20")]
    pub max_frames: usize,
}

/// Print the theoretical SNR improvement of every stacking method.
pub fn run(args: &SnrArgs) -> Result<()> {
    let header = Style::new().cyan().bold();
    let label = Style::new().dim();
    let methods = [
        StackMethod::Mean,
        StackMethod::Median,
        StackMethod::SigmaClip(SigmaClipParams::default()),
    ];

    println!();
    println!(
        "  {:>6}  {:>10}  {:>10}  {:>10}",
        header.apply_to("Frames"),
        header.apply_to("Mean"),
        header.apply_to("Median"),
        header.apply_to("Sigma-clip")
    );
    for n in 1..=args.max_frames.max(1) {
        let [mean, median, clip] = methods.map(|m| compute_snr_improvement(n, &m));
        println!(
            "  {:>6}  {:>10.2}  {:>10.2}  {:>10.2}",
            label.apply_to(n),
            mean,
            median,
            clip
        );
    }
    println!();
    Ok(())
}
