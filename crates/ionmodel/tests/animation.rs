//! Frame gathering for animation renderers.

mod common;

use ionmodel::{AnimationOptions, FrameRenderer, IonModelError, PlotStyle, SkyFrame};
use test_utils::{assert_between, frequencies, time};

use common::coarse_model;

/// Keeps whatever it was handed.
#[derive(Default)]
struct RecordingRenderer {
    calls: Vec<(String, Vec<SkyFrame>, PlotStyle)>,
}

impl FrameRenderer for RecordingRenderer {
    fn render(
        &mut self,
        title: &str,
        frames: &[SkyFrame],
        style: &PlotStyle,
    ) -> Result<(), String> {
        self.calls.push((title.to_string(), frames.to_vec(), style.clone()));
        Ok(())
    }
}

struct BrokenRenderer;

impl FrameRenderer for BrokenRenderer {
    fn render(
        &mut self,
        _title: &str,
        _frames: &[SkyFrame],
        _style: &PlotStyle,
    ) -> Result<(), String> {
        Err("ffmpeg not found".to_string())
    }
}

fn small_options() -> AnimationOptions {
    AnimationOptions {
        nframes: 4,
        gridsize: 6,
        style: PlotStyle::default()
            .with_cmap("plasma")
            .with_option("dpi", "150"),
        ..AnimationOptions::default()
    }
}

#[test]
fn test_frames_cover_window() {
    let model = coarse_model();
    let mut renderer = RecordingRenderer::default();
    model.animate_fed_vs_time(&mut renderer, &small_options()).unwrap();

    assert_eq!(renderer.calls.len(), 1);
    let (title, frames, style) = &renderer.calls[0];
    assert!(title.contains('F'), "unexpected title {}", title);
    assert_eq!(frames.len(), 4);
    assert_eq!(frames[0].time, time::reference());
    assert_eq!(frames[3].time, time::hours_after(3));
    assert_eq!(frames[1].time, time::hours_after(1));
    for frame in frames {
        assert_eq!(frame.gridsize, 6);
        assert_eq!(frame.values.len(), 36);
        assert_eq!(frame.el.len(), 36);
        assert_eq!(frame.az.len(), 36);
        assert!(frame.values.iter().all(|v| v.is_finite() && *v >= 0.0));
    }
    assert_eq!(style.cmap, "plasma");
    assert_eq!(style.options.get("dpi").map(String::as_str), Some("150"));
}

#[test]
fn test_mesh_keeps_horizon_row() {
    let model = coarse_model();
    let mut renderer = RecordingRenderer::default();
    model.animate_det_vs_time(&mut renderer, &small_options()).unwrap();

    let frame = &renderer.calls[0].1[0];
    assert_eq!(frame.el[0], 0.0);
    assert_eq!(frame.el[5], 90.0);
    assert_eq!(frame.az[0], 0.0);
    assert_eq!(frame.az[35], 360.0);
}

#[test]
fn test_attenuation_frames_are_factors() {
    let model = coarse_model();
    let mut renderer = RecordingRenderer::default();
    model
        .animate_atten_vs_time(&mut renderer, frequencies::HF_10, &small_options())
        .unwrap();

    for frame in &renderer.calls[0].1 {
        for &v in &frame.values {
            assert_between!(v, 0.0, 1.0);
        }
    }
}

#[test]
fn test_refraction_frames() {
    let model = coarse_model();
    let mut renderer = RecordingRenderer::default();
    model
        .animate_refr_vs_time(&mut renderer, frequencies::VHF_50, &small_options())
        .unwrap();

    let (title, frames, _) = &renderer.calls[0];
    assert!(title.contains("50"));
    assert!(frames.iter().flat_map(|f| &f.values).all(|v| v.is_finite()));
}

#[test]
fn test_density_and_temperature_animations() {
    let model = coarse_model();
    let mut renderer = RecordingRenderer::default();
    let options = small_options();
    model.animate_ded_vs_time(&mut renderer, &options).unwrap();
    model.animate_fet_vs_time(&mut renderer, &options).unwrap();
    assert_eq!(renderer.calls.len(), 2);
    assert_ne!(renderer.calls[0].0, renderer.calls[1].0);
}

#[test]
fn test_renderer_failure_is_reported() {
    let model = coarse_model();
    let err = model
        .animate_ded_vs_time(&mut BrokenRenderer, &small_options())
        .unwrap_err();
    match err {
        IonModelError::Render(message) => assert!(message.contains("ffmpeg")),
        other => panic!("unexpected error {:?}", other),
    }
}

#[test]
fn test_zero_frames_rejected() {
    let model = coarse_model();
    let mut renderer = RecordingRenderer::default();
    let options = AnimationOptions {
        nframes: 0,
        ..small_options()
    };
    assert!(matches!(
        model.animate_fed_vs_time(&mut renderer, &options),
        Err(IonModelError::Configuration(_))
    ));
    assert!(renderer.calls.is_empty());
}
