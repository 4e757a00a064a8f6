use std::path::Path;

use astrocam_core::pipeline::{SessionConfig, SessionReport};
use astrocam_core::sensor::CameraSpec;
use console::Style;

struct Styles {
    title: Style,
    header: Style,
    label: Style,
    value: Style,
    method: Style,
    disabled: Style,
    path: Style,
}

impl Styles {
    fn new() -> Self {
        Self {
            title: Style::new().cyan().bold(),
            header: Style::new().cyan().bold(),
            label: Style::new().dim(),
            value: Style::new().bold().white(),
            method: Style::new().green(),
            disabled: Style::new().dim().yellow(),
            path: Style::new().underlined(),
        }
    }
}

fn rule(s: &Styles) -> String {
    s.title.apply_to("\u{2550}".repeat(17)).to_string()
}

pub fn print_session_summary(config: &SessionConfig, spec: &CameraSpec, output: &Path) {
    let s = Styles::new();
    let optics = config.optics_for(spec);
    let (fov_w, fov_h) = optics.fov_deg();

    println!();
    println!("  {}", s.title.apply_to("Imaging Session"));
    println!("  {}", rule(&s));
    println!();
    println!("  {:<14}{}", s.label.apply_to("Target"), s.value.apply_to(&config.target_name));
    println!(
        "  {:<14}{}",
        s.label.apply_to("Pointing"),
        s.value.apply_to(format!(
            "RA {:.3}°  Dec {:+.3}°  Alt {:.0}°",
            config.pointing.ra_deg, config.pointing.dec_deg, config.pointing.alt_deg
        ))
    );
    println!("  {:<14}{}", s.label.apply_to("Output"), s.path.apply_to(output.display()));
    println!();

    println!("  {}", s.header.apply_to("Equipment"));
    println!("    {:<12}{}", s.label.apply_to("Camera"), s.value.apply_to(spec));
    println!(
        "    {:<12}{}",
        s.label.apply_to("Telescope"),
        s.value.apply_to(format!(
            "{:.0}mm f/{:.1} ({:.0}mm)",
            optics.aperture_mm,
            optics.focal_ratio(),
            optics.focal_length_mm
        ))
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Field"),
        s.value.apply_to(format!(
            "{:.2}° x {:.2}° at {:.2}\"/px",
            fov_w,
            fov_h,
            optics.pixel_scale_arcsec()
        ))
    );
    match config.cooling_target_c {
        Some(t) => println!(
            "    {:<12}{}",
            s.label.apply_to("Cooling"),
            s.value.apply_to(format!("{t:.1} °C"))
        ),
        None => println!(
            "    {:<12}{}",
            s.label.apply_to("Cooling"),
            s.disabled.apply_to("off")
        ),
    }
    println!();

    println!("  {}", s.header.apply_to("Acquisition"));
    println!(
        "    {:<12}{}",
        s.label.apply_to("Lights"),
        s.value.apply_to(format!(
            "{} x {:.1}s",
            config.frames.lights, config.light_exposure_s
        ))
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Calibration"),
        s.value.apply_to(format!(
            "{} bias, {} dark, {} flat",
            config.frames.biases, config.frames.darks, config.frames.flats
        ))
    );
    println!();

    println!("  {}", s.header.apply_to("Stacking"));
    println!(
        "    {:<12}{}",
        s.label.apply_to("Method"),
        s.method.apply_to(config.stacking.method)
    );
    let align = if !config.stacking.align {
        s.disabled.apply_to("disabled".to_string())
    } else if config.stacking.subpixel {
        s.method.apply_to("subpixel (bilinear)".to_string())
    } else {
        s.method.apply_to("whole pixel".to_string())
    };
    println!("    {:<12}{}", s.label.apply_to("Alignment"), align);
    let cosmetic = if config.cosmetic_correction {
        s.method.apply_to("median replace")
    } else {
        s.disabled.apply_to("off")
    };
    println!("    {:<12}{}", s.label.apply_to("Cosmetic"), cosmetic);
    println!();
}

pub fn print_session_report(report: &SessionReport, output: &Path) {
    let s = Styles::new();

    println!();
    println!("  {}", s.title.apply_to("Session Report"));
    println!("  {}", rule(&s));
    println!();
    println!("  {:<22}{}", s.label.apply_to("Camera"), s.value.apply_to(&report.camera));
    println!(
        "  {:<22}{}",
        s.label.apply_to("Frames"),
        s.value.apply_to(format!(
            "{} light, {} dark, {} flat, {} bias",
            report.light_count, report.dark_count, report.flat_count, report.bias_count
        ))
    );
    println!(
        "  {:<22}{}",
        s.label.apply_to("Integration"),
        s.value.apply_to(format!("{:.1}s", report.total_integration_s))
    );
    println!("  {:<22}{}", s.label.apply_to("Method"), s.method.apply_to(report.method));

    let max_shift = report
        .shifts
        .iter()
        .map(|o| o.dx.hypot(o.dy))
        .fold(0.0f64, f64::max);
    println!(
        "  {:<22}{}",
        s.label.apply_to("Largest shift"),
        s.value.apply_to(format!("{max_shift:.2} px"))
    );
    println!();

    println!("  {}", s.header.apply_to("Signal to noise"));
    println!(
        "    {:<20}{}",
        s.label.apply_to("Single frame"),
        s.value.apply_to(format!("{:.2}", report.single_frame_snr))
    );
    println!(
        "    {:<20}{}",
        s.label.apply_to("Stacked"),
        s.value.apply_to(format!("{:.2}", report.stacked_snr))
    );
    println!(
        "    {:<20}{}",
        s.label.apply_to("Measured gain"),
        s.value.apply_to(format!("{:.2}x", report.measured_improvement()))
    );
    println!(
        "    {:<20}{}",
        s.label.apply_to("Theoretical gain"),
        s.value.apply_to(format!("{:.2}x", report.theoretical_improvement))
    );
    println!(
        "    {:<20}{}",
        s.label.apply_to("Estimated final"),
        s.value.apply_to(format!("{:.2}", report.estimated_final_snr))
    );

    let q = &report.stacked_quality;
    let stars = q
        .star_count
        .map_or_else(|| "n/a".to_string(), |n| n.to_string());
    let fwhm = q
        .fwhm_px
        .map_or_else(|| "n/a".to_string(), |f| format!("{f:.2} px"));
    println!("    {:<20}{}", s.label.apply_to("Stars detected"), s.value.apply_to(stars));
    println!("    {:<20}{}", s.label.apply_to("Median FWHM"), s.value.apply_to(fwhm));
    println!();
    println!("  Stacked image saved to {}", s.path.apply_to(output.display()));
    println!();
}
