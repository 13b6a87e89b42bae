use std::io::Cursor;
use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb};
use plotters::prelude::LineSeries;
use plotters::prelude::*;
use crate::config::ProcessingConfig;
use crate::pulse::error::PulseError;
use crate::pulse::series::DerivedSeries;
use crate::pulse::synth::{WaveformPreview, WaveformSpec};
#[derive(Clone, Debug)]
pub struct PlotStyle {
    pub width: u32,
    pub height: u32,
    pub background: RGBColor,
    pub palette: Vec<RGBColor>,
}
impl Default for PlotStyle {
    fn default() -> Self {
        Self {
            width: 900,
            height: 400,
            background: RGBColor(10, 10, 10),
            palette: vec![BLUE, RED, GREEN, CYAN, MAGENTA, YELLOW, WHITE],
        }
    }
}
struct Trace<'a> {
    label: &'a str,
    x: &'a [f64],
    y: &'a [f64],
}
struct Axes<'a> {
    x_label: String,
    y_label: String,
    /// Pin the lower y bound, e.g. 0 for conductance.
    y_floor: Option<f64>,
    caption: &'a str,
}
fn bounds<'a>(values: impl Iterator<Item = &'a f64>) -> (f64, f64) {
    let (min, max) = values
        .copied()
        .filter(|v| v.is_finite())
        .fold((f64::MAX, f64::MIN), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if min > max {
        return (-1.0, 1.0);
    }
    if (max - min).abs() < f64::EPSILON {
        let pad = min.abs().max(1.0) * 0.5;
        return (min - pad, max + pad);
    }
    (min, max)
}
fn render_traces_png(
    traces: &[Trace<'_>],
    axes: Axes<'_>,
    style: &PlotStyle,
) -> Result<Vec<u8>, PulseError> {
    if traces.iter().all(|t| t.x.is_empty()) {
        return Err(PulseError::Plot(format!("{}: no samples to draw", axes.caption)));
    }
    let x_bounds = bounds(traces.iter().flat_map(|t| t.x.iter()));
    let mut y_bounds = bounds(traces.iter().flat_map(|t| t.y.iter()));
    if let Some(floor) = axes.y_floor {
        y_bounds.0 = floor;
        if y_bounds.1 <= floor {
            y_bounds.1 = floor + 1.0;
        }
    }
    let mut buffer = vec![0u8; (style.width * style.height * 3) as usize];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (style.width, style.height))
            .into_drawing_area();
        root.fill(&style.background)?;
        let mut chart = ChartBuilder::on(&root)
            .margin(10)
            .caption(axes.caption, ("sans-serif", 20).into_font().color(&WHITE))
            .set_label_area_size(LabelAreaPosition::Left, 55)
            .set_label_area_size(LabelAreaPosition::Bottom, 40)
            .build_cartesian_2d(x_bounds.0..x_bounds.1, y_bounds.0..y_bounds.1)?;
        chart
            .configure_mesh()
            .x_desc(axes.x_label)
            .y_desc(axes.y_label)
            .axis_desc_style(("sans-serif", 14).into_font().color(&WHITE))
            .label_style(("sans-serif", 12).into_font().color(&WHITE))
            .light_line_style(&WHITE.mix(0.1))
            .draw()?;
        for (idx, trace) in traces.iter().enumerate() {
            let color = style.palette[idx % style.palette.len()];
            let points = trace.x.iter().copied().zip(trace.y.iter().copied());
            chart
                .draw_series(LineSeries::new(points, &color))?
                .label(trace.label)
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &color));
        }
        chart
            .configure_series_labels()
            .label_font(("sans-serif", 12).into_font().color(&WHITE))
            .border_style(&WHITE.mix(0.2))
            .background_style(&style.background)
            .draw()?;
        root.present()?;
    }
    encode_png(&buffer, style.width, style.height)
}
/// Chart title suffix: amplitude rounded to two places and the period in µs.
pub fn waveform_title(kind: &str, spec: &WaveformSpec) -> String {
    format!(
        "{kind}: Amplitude = {:.2} V, Period = {} µs",
        spec.amplitude, spec.period_us
    )
}
pub fn render_waveform_png(
    preview: &WaveformPreview,
    spec: &WaveformSpec,
    config: &ProcessingConfig,
    style: &PlotStyle,
) -> Result<Vec<u8>, PulseError> {
    let caption = waveform_title("Waveform", spec);
    render_traces_png(
        &[Trace {
            label: "waveform",
            x: &preview.time,
            y: &preview.amplitude,
        }],
        Axes {
            x_label: format!("Time [{}]", config.time_unit.label()),
            y_label: "Voltage [V]".into(),
            y_floor: None,
            caption: &caption,
        },
        style,
    )
}
/// V1 and V2 against time.
pub fn render_capture_png(
    series: &DerivedSeries,
    spec: &WaveformSpec,
    config: &ProcessingConfig,
    style: &PlotStyle,
) -> Result<Vec<u8>, PulseError> {
    let caption = waveform_title("Capture", spec);
    render_traces_png(
        &[
            Trace {
                label: "V1",
                x: &series.time,
                y: &series.v1,
            },
            Trace {
                label: "V2",
                x: &series.time,
                y: &series.v2,
            },
        ],
        Axes {
            x_label: format!("Time [{}]", config.time_unit.label()),
            y_label: "Voltage [V]".into(),
            y_floor: None,
            caption: &caption,
        },
        style,
    )
}
/// Current against applied voltage.
pub fn render_iv_png(
    series: &DerivedSeries,
    spec: &WaveformSpec,
    config: &ProcessingConfig,
    style: &PlotStyle,
) -> Result<Vec<u8>, PulseError> {
    let caption = waveform_title("I-V", spec);
    render_traces_png(
        &[Trace {
            label: "iv",
            x: &series.v1,
            y: &series.current,
        }],
        Axes {
            x_label: "Voltage [V]".into(),
            y_label: format!("Current [{}]", config.current_unit.label()),
            y_floor: None,
            caption: &caption,
        },
        style,
    )
}
/// Conductance against applied voltage; the y axis starts at zero.
pub fn render_gv_png(
    series: &DerivedSeries,
    spec: &WaveformSpec,
    config: &ProcessingConfig,
    style: &PlotStyle,
) -> Result<Vec<u8>, PulseError> {
    let caption = waveform_title("G-V", spec);
    render_traces_png(
        &[Trace {
            label: "gv",
            x: &series.v1,
            y: &series.conductance,
        }],
        Axes {
            x_label: "Voltage [V]".into(),
            y_label: format!("Conductance [{}]", config.conductance_unit.label()),
            y_floor: Some(0.0),
            caption: &caption,
        },
        style,
    )
}
fn encode_png(buffer: &[u8], width: u32, height: u32) -> Result<Vec<u8>, PulseError> {
    let image = ImageBuffer::<Rgb<u8>, _>::from_raw(width, height, buffer.to_vec())
        .ok_or_else(|| PulseError::Plot("failed to allocate image buffer".into()))?;
    let mut output = Vec::new();
    let dynamic = DynamicImage::ImageRgb8(image);
    dynamic.write_to(&mut Cursor::new(&mut output), ImageFormat::Png)?;
    Ok(output)
}
#[cfg(test)]
mod tests {
    use super::*;
    use crate::pulse::series::{derive_series, UnitDivisors};
    use crate::pulse::synth::{preview, WaveformShape};
    fn spec() -> WaveformSpec {
        WaveformSpec {
            shape: WaveformShape::Sine,
            amplitude: 0.756,
            offset_voltage: 0.0,
            period_us: 500,
            pulse_count: 1,
        }
    }
    #[test]
    fn title_rounds_amplitude() {
        assert_eq!(
            waveform_title("G-V", &spec()),
            "G-V: Amplitude = 0.76 V, Period = 500 µs"
        );
    }
    #[test]
    fn bounds_ignore_non_finite_and_pad_flat_lines() {
        assert_eq!(bounds([1.0, f64::NAN, 3.0].iter()), (1.0, 3.0));
        assert_eq!(bounds([2.0, 2.0].iter()), (1.0, 3.0));
        assert_eq!(bounds([].iter()), (-1.0, 1.0));
    }
    #[test]
    fn plotting_helpers_return_png() {
        let config = ProcessingConfig::default();
        let style = PlotStyle::default();
        let v1 = [0.1, 0.4, 0.8, 0.4, 0.1];
        let v2 = [0.01, 0.05, 0.2, 0.05, 0.01];
        let series = derive_series(&v1, &v2, 10_000.0, 5_000.0, &UnitDivisors::default()).unwrap();
        let png_capture = render_capture_png(&series, &spec(), &config, &style).unwrap();
        let png_iv = render_iv_png(&series, &spec(), &config, &style).unwrap();
        let png_gv = render_gv_png(&series, &spec(), &config, &style).unwrap();
        let wave = preview(&spec(), 400_000.0, 1.0e3).unwrap();
        let png_wave = render_waveform_png(&wave, &spec(), &config, &style).unwrap();
        for png in [png_capture, png_iv, png_gv, png_wave] {
            assert!(png.starts_with(&[0x89, b'P', b'N', b'G']));
        }
    }
    #[test]
    fn empty_series_is_a_plot_error() {
        let series = derive_series(&[], &[], 1_000.0, 100.0, &UnitDivisors::default()).unwrap();
        let err = render_capture_png(
            &series,
            &spec(),
            &ProcessingConfig::default(),
            &PlotStyle::default(),
        )
        .unwrap_err();
        assert!(matches!(err, PulseError::Plot(_)));
    }
}
