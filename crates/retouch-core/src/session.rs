//! Editing session state.
//!
//! `EditSession` owns everything the host UI mutates: the source image, the
//! adjustment snapshot and its LUT cache, the curve editor, the brush engine
//! and mask, and the latest result from the image edit service. Every change
//! goes through a method here; there is no hidden shared state.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::adjustments::Adjustments;
use crate::compare::CompareSlider;
use crate::curve::CurveLuts;
use crate::decode::{decode_image, DecodeError, ImageRaster};
use crate::editor::{CurveEditor, PointerButton};
use crate::encode::{encode_image, encode_png, EncodeError};
use crate::mask::{apply_mask, BrushEngine, BrushSettings};
use crate::pipeline::{AdjustmentPipeline, RenderQueue, RenderedFrame};
use crate::{Channel, Curve, DisplayRect};

/// Session-level failures.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no image loaded")]
    NoImage,

    #[error("prompt is empty")]
    EmptyPrompt,

    #[error("mask mode requires a painted mask")]
    MissingMask,

    #[error("the service returned neither an image nor text")]
    NoResult,

    #[error("image has already been upscaled")]
    AlreadyUpscaled,

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error("image service failed: {0}")]
    Collaborator(String),
}

/// Failure reported by an `ImageEditService` implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ServiceError(pub String);

impl From<ServiceError> for SessionError {
    fn from(err: ServiceError) -> Self {
        SessionError::Collaborator(err.0)
    }
}

/// Whether an edit applies to the whole image or the painted region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditMode {
    #[default]
    Global,
    Mask,
}

/// Target aspect ratio requested from the edit service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AspectRatio {
    #[default]
    #[serde(rename = "1:1")]
    Square,
    #[serde(rename = "16:9")]
    Landscape,
    #[serde(rename = "9:16")]
    Portrait,
    #[serde(rename = "4:3")]
    Standard,
    #[serde(rename = "3:4")]
    StandardPortrait,
    /// Keep whatever the image has; the prompt is sent unwrapped.
    #[serde(rename = "Original")]
    Original,
}

impl AspectRatio {
    pub const ALL: [AspectRatio; 6] = [
        AspectRatio::Square,
        AspectRatio::Landscape,
        AspectRatio::Portrait,
        AspectRatio::Standard,
        AspectRatio::StandardPortrait,
        AspectRatio::Original,
    ];

    pub fn label(self) -> &'static str {
        match self {
            AspectRatio::Square => "1:1",
            AspectRatio::Landscape => "16:9",
            AspectRatio::Portrait => "9:16",
            AspectRatio::Standard => "4:3",
            AspectRatio::StandardPortrait => "3:4",
            AspectRatio::Original => "Original",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        AspectRatio::ALL
            .into_iter()
            .find(|r| r.label().eq_ignore_ascii_case(label.trim()))
    }

    /// Prefix the prompt with the aspect ratio instruction, unless `Original`.
    pub fn wrap_prompt(self, prompt: &str) -> String {
        match self {
            AspectRatio::Original => prompt.to_string(),
            ratio => format!(
                "Please ensure the final image has an aspect ratio of {}. Then, fulfill this request: \"{}\"",
                ratio.label(),
                prompt
            ),
        }
    }
}

/// Encoded image bytes with their mime type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedImage {
    pub bytes: Vec<u8>,
    pub mime: String,
}

/// Everything the edit service needs for one request.
#[derive(Debug, Clone, PartialEq)]
pub struct EditRequest {
    /// The adjusted source, re-encoded to its original mime type.
    pub image: EncodedImage,
    pub prompt: String,
    /// PNG mask, present only in mask mode.
    pub mask: Option<EncodedImage>,
}

/// What the edit service returned. Either part may be missing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EditResponse {
    pub image: Option<EncodedImage>,
    pub text: Option<String>,
}

/// The generative editing backend the session talks to.
pub trait ImageEditService {
    fn edit(&mut self, request: &EditRequest) -> Result<EditResponse, ServiceError>;

    fn enhance_prompt(&mut self, prompt: &str) -> Result<String, ServiceError>;

    /// Returns None when the service produced no image.
    fn upscale(&mut self, image: &EncodedImage) -> Result<Option<EncodedImage>, ServiceError>;
}

/// State of one editing session.
#[derive(Debug)]
pub struct EditSession {
    source: Option<ImageRaster>,
    adjustments: Adjustments,
    luts: CurveLuts,
    curve_editor: CurveEditor,
    brush: BrushEngine,
    mode: EditMode,
    mask: Option<ImageRaster>,
    aspect_ratio: AspectRatio,
    edited: Option<EncodedImage>,
    response_text: Option<String>,
    is_upscaled: bool,
    preview: RenderQueue,
    compare: CompareSlider,
}

impl Default for EditSession {
    fn default() -> Self {
        Self::new()
    }
}

impl EditSession {
    pub fn new() -> Self {
        Self {
            source: None,
            adjustments: Adjustments::default(),
            luts: CurveLuts::default(),
            curve_editor: CurveEditor::new(),
            brush: BrushEngine::new(0, 0),
            mode: EditMode::Global,
            mask: None,
            aspect_ratio: AspectRatio::default(),
            edited: None,
            response_text: None,
            is_upscaled: false,
            preview: RenderQueue::new(),
            compare: CompareSlider::new(),
        }
    }

    // ========================================================================
    // Image lifecycle
    // ========================================================================

    /// Decode and adopt a new source image, then soft-reset the session.
    ///
    /// On decode failure the session is left exactly as it was.
    pub fn load_image(&mut self, bytes: &[u8], mime: &str) -> Result<(), SessionError> {
        let raster = decode_image(bytes, mime)?;
        log::debug!(
            "loaded {} source {}x{}",
            raster.mime_type(),
            raster.width,
            raster.height
        );
        self.brush.reset_surface(raster.width, raster.height);
        self.source = Some(raster);
        self.reset();
        Ok(())
    }

    /// Drop the image and every derived state.
    pub fn close_image(&mut self) {
        self.source = None;
        self.brush.reset_surface(0, 0);
        self.reset();
        self.preview = RenderQueue::new();
    }

    pub fn source(&self) -> Option<&ImageRaster> {
        self.source.as_ref()
    }

    pub fn has_image(&self) -> bool {
        self.source.is_some()
    }

    /// Replace adjustments and brush settings with their defaults and clear
    /// the mask, results and request options. The source image is kept.
    pub fn reset(&mut self) {
        self.adjustments = Adjustments::default();
        self.luts = CurveLuts::default();
        self.curve_editor = CurveEditor::new();
        self.brush.set_settings(BrushSettings::default());
        self.brush.clear();
        self.mode = EditMode::Global;
        self.mask = None;
        self.aspect_ratio = AspectRatio::default();
        self.clear_result();
        self.compare = CompareSlider::new();
        self.preview.submit(self.adjustments.clone());
    }

    // ========================================================================
    // Adjustments and curves
    // ========================================================================

    pub fn adjustments(&self) -> &Adjustments {
        &self.adjustments
    }

    /// Replace the adjustment snapshot wholesale. Values are clamped.
    pub fn set_adjustments(&mut self, adjustments: Adjustments) {
        let adjustments = adjustments.clamped();
        if adjustments.curves != self.adjustments.curves {
            self.luts = CurveLuts::from_curves(&adjustments.curves);
        }
        self.adjustments = adjustments;
        self.preview.submit(self.adjustments.clone());
    }

    pub fn luts(&self) -> &CurveLuts {
        &self.luts
    }

    /// Replace a single channel's curve.
    pub fn set_curve(&mut self, channel: Channel, curve: Curve) {
        *self.adjustments.curves.get_mut(channel) = curve;
        self.curves_changed(channel);
    }

    pub fn curve_editor(&self) -> &CurveEditor {
        &self.curve_editor
    }

    pub fn set_active_channel(&mut self, channel: Channel) {
        self.curve_editor.set_active(channel);
    }

    /// Pointer press on the curve canvas. Returns true if a curve changed.
    pub fn curve_press(
        &mut self,
        rect: &DisplayRect,
        client_x: f32,
        client_y: f32,
        button: PointerButton,
        ctrl: bool,
    ) -> bool {
        let changed = self.curve_editor.press(
            &mut self.adjustments.curves,
            rect,
            client_x,
            client_y,
            button,
            ctrl,
        );
        self.apply_curve_change(changed)
    }

    /// Pointer move over the curve canvas. Returns true if a curve changed.
    pub fn curve_drag(&mut self, rect: &DisplayRect, client_x: f32, client_y: f32) -> bool {
        let changed = self
            .curve_editor
            .drag(&mut self.adjustments.curves, rect, client_x, client_y);
        self.apply_curve_change(changed)
    }

    pub fn curve_release(&mut self) {
        self.curve_editor.release();
    }

    fn apply_curve_change(&mut self, changed: Option<Channel>) -> bool {
        match changed {
            Some(channel) => {
                self.curves_changed(channel);
                true
            }
            None => false,
        }
    }

    fn curves_changed(&mut self, channel: Channel) {
        self.luts.rebuild(channel, &self.adjustments.curves);
        self.preview.submit(self.adjustments.clone());
    }

    /// Render the newest adjustment snapshot for display.
    pub fn render_preview(&mut self) -> Option<RenderedFrame> {
        let source = self.source.as_ref()?;
        self.preview.render_latest(source)
    }

    /// True if `generation` is still the newest preview submission.
    pub fn is_preview_current(&self, generation: u64) -> bool {
        self.preview.is_current(generation)
    }

    /// Run the pipeline on the current snapshot and re-encode it to the
    /// source's own mime type.
    pub fn bake(&self) -> Result<EncodedImage, SessionError> {
        let adjusted = self.adjusted_source()?;
        let bytes = encode_image(&adjusted)?;
        Ok(EncodedImage {
            bytes,
            mime: adjusted.mime_type().to_string(),
        })
    }

    fn adjusted_source(&self) -> Result<ImageRaster, SessionError> {
        let source = self.source.as_ref().ok_or(SessionError::NoImage)?;
        Ok(AdjustmentPipeline::with_luts(&self.adjustments, self.luts.clone()).process(source))
    }

    // ========================================================================
    // Mask painting
    // ========================================================================

    pub fn mode(&self) -> EditMode {
        self.mode
    }

    /// Switch edit mode. Entering mask mode starts from a blank mask.
    /// Switch editing mode. Entering mask mode starts from a blank mask;
    /// leaving it ends any stroke in progress and keeps what was painted.
    pub fn set_mode(&mut self, mode: EditMode) {
        if mode == self.mode {
            return;
        }
        match mode {
            EditMode::Mask => {
                self.brush.clear();
                self.mask = None;
            }
            EditMode::Global => self.pointer_up(),
        }
        self.mode = mode;
    }

    pub fn brush_settings(&self) -> &BrushSettings {
        self.brush.settings()
    }

    pub fn set_brush_settings(&mut self, settings: BrushSettings) {
        self.brush.set_settings(settings);
    }

    pub fn brush(&self) -> &BrushEngine {
        &self.brush
    }

    /// Start a stroke. Ignored outside mask mode or without an image.
    pub fn pointer_down(&mut self, rect: &DisplayRect, client_x: f32, client_y: f32) -> bool {
        if self.mode != EditMode::Mask || self.source.is_none() {
            return false;
        }
        match self.brush.map_pointer(rect, client_x, client_y) {
            Some(point) => {
                self.brush.pointer_down(point);
                true
            }
            None => false,
        }
    }

    pub fn pointer_move(&mut self, rect: &DisplayRect, client_x: f32, client_y: f32) {
        if !self.brush.is_drawing() {
            return;
        }
        if let Some(point) = self.brush.map_pointer(rect, client_x, client_y) {
            self.brush.pointer_move(point);
        }
    }

    /// End the stroke; the finalized mask replaces the previous one.
    pub fn pointer_up(&mut self) {
        if let Some(mask) = self.brush.pointer_up() {
            self.mask = Some(mask);
        }
    }

    pub fn pointer_leave(&mut self) {
        if let Some(mask) = self.brush.pointer_leave() {
            self.mask = Some(mask);
        }
    }

    pub fn mask(&self) -> Option<&ImageRaster> {
        self.mask.as_ref()
    }

    /// The current mask as PNG bytes.
    pub fn mask_png(&self) -> Result<Option<Vec<u8>>, SessionError> {
        self.mask
            .as_ref()
            .map(|mask| encode_png(mask).map_err(SessionError::from))
            .transpose()
    }

    pub fn compare(&self) -> &CompareSlider {
        &self.compare
    }

    pub fn compare_mut(&mut self) -> &mut CompareSlider {
        &mut self.compare
    }

    // ========================================================================
    // Edit service
    // ========================================================================

    pub fn aspect_ratio(&self) -> AspectRatio {
        self.aspect_ratio
    }

    pub fn set_aspect_ratio(&mut self, ratio: AspectRatio) {
        self.aspect_ratio = ratio;
    }

    /// Validate and assemble an edit request.
    ///
    /// Requires an image and a non-blank prompt, and in mask mode a painted
    /// mask. The image is baked with the current adjustments.
    pub fn prepare_edit(&self, prompt: &str) -> Result<EditRequest, SessionError> {
        if self.source.is_none() {
            return Err(SessionError::NoImage);
        }
        if prompt.trim().is_empty() {
            return Err(SessionError::EmptyPrompt);
        }

        let mask = match self.mode {
            EditMode::Global => None,
            EditMode::Mask => {
                let mask = self.mask.as_ref().ok_or(SessionError::MissingMask)?;
                Some(EncodedImage {
                    bytes: encode_png(mask)?,
                    mime: "image/png".to_string(),
                })
            }
        };

        Ok(EditRequest {
            image: self.bake()?,
            prompt: self.aspect_ratio.wrap_prompt(prompt),
            mask,
        })
    }

    /// Forget the previous result before a new request goes out.
    pub fn clear_result(&mut self) {
        self.edited = None;
        self.response_text = None;
        self.is_upscaled = false;
    }

    /// Store a service response. Empty responses are an error.
    pub fn accept_edit_response(&mut self, response: EditResponse) -> Result<(), SessionError> {
        if response.image.is_none() && response.text.is_none() {
            log::warn!("edit service returned an empty response");
            return Err(SessionError::NoResult);
        }
        self.edited = response.image;
        self.response_text = response.text;
        Ok(())
    }

    /// Run a full edit round trip through `service`.
    pub fn generate<S: ImageEditService + ?Sized>(
        &mut self,
        service: &mut S,
        prompt: &str,
    ) -> Result<(), SessionError> {
        let request = self.prepare_edit(prompt)?;
        self.clear_result();
        let response = service.edit(&request)?;
        self.accept_edit_response(response)
    }

    pub fn enhance_prompt<S: ImageEditService + ?Sized>(
        &mut self,
        service: &mut S,
        prompt: &str,
    ) -> Result<String, SessionError> {
        if prompt.trim().is_empty() {
            return Err(SessionError::EmptyPrompt);
        }
        Ok(service.enhance_prompt(prompt)?.trim().to_string())
    }

    /// Ask the service to upscale the current result, at most once.
    pub fn upscale<S: ImageEditService + ?Sized>(
        &mut self,
        service: &mut S,
    ) -> Result<(), SessionError> {
        let upscaled = service.upscale(self.prepare_upscale()?)?;
        self.accept_upscale(upscaled)
    }

    /// The image to send for upscaling, if upscaling is allowed now.
    pub fn prepare_upscale(&self) -> Result<&EncodedImage, SessionError> {
        if self.is_upscaled {
            return Err(SessionError::AlreadyUpscaled);
        }
        self.edited.as_ref().ok_or(SessionError::NoImage)
    }

    /// Store an upscale result. A missing image is an error.
    pub fn accept_upscale(&mut self, image: Option<EncodedImage>) -> Result<(), SessionError> {
        let image = image.ok_or(SessionError::NoResult)?;
        self.edited = Some(image);
        self.is_upscaled = true;
        Ok(())
    }

    pub fn edited_image(&self) -> Option<&EncodedImage> {
        self.edited.as_ref()
    }

    pub fn response_text(&self) -> Option<&str> {
        self.response_text.as_deref()
    }

    pub fn is_upscaled(&self) -> bool {
        self.is_upscaled
    }

    /// Blend the edited result into the adjusted source through the mask.
    ///
    /// Returns None unless both a result image and a mask exist.
    pub fn composite_result(&self) -> Result<Option<ImageRaster>, SessionError> {
        let (Some(edited), Some(mask)) = (&self.edited, &self.mask) else {
            return Ok(None);
        };
        let original = self.adjusted_source()?;
        let edited = decode_image(&edited.bytes, &edited.mime)?;
        Ok(Some(apply_mask(&original, &edited, mask)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::ImageFormat;
    use crate::mask::BrushMode;
    use crate::CurvePoint;

    fn png_bytes(width: u32, height: u32, rgba: [u8; 4]) -> Vec<u8> {
        encode_png(&ImageRaster::filled(width, height, rgba, ImageFormat::Png)).unwrap()
    }

    fn loaded(width: u32, height: u32) -> EditSession {
        let mut session = EditSession::new();
        session
            .load_image(&png_bytes(width, height, [128, 128, 128, 255]), "image/png")
            .unwrap();
        session
    }

    /// Display rect matching the image 1:1.
    fn rect(width: u32, height: u32) -> DisplayRect {
        DisplayRect::new(0.0, 0.0, width as f32, height as f32)
    }

    #[derive(Default)]
    struct MockService {
        requests: Vec<EditRequest>,
        response: EditResponse,
        upscaled: Option<EncodedImage>,
        fail: bool,
    }

    impl ImageEditService for MockService {
        fn edit(&mut self, request: &EditRequest) -> Result<EditResponse, ServiceError> {
            self.requests.push(request.clone());
            if self.fail {
                return Err(ServiceError("quota exceeded".to_string()));
            }
            Ok(self.response.clone())
        }

        fn enhance_prompt(&mut self, prompt: &str) -> Result<String, ServiceError> {
            Ok(format!("  a vivid {}  ", prompt))
        }

        fn upscale(&mut self, _image: &EncodedImage) -> Result<Option<EncodedImage>, ServiceError> {
            Ok(self.upscaled.clone())
        }
    }

    fn image_response() -> EditResponse {
        EditResponse {
            image: Some(EncodedImage {
                bytes: png_bytes(4, 4, [255, 0, 0, 255]),
                mime: "image/png".to_string(),
            }),
            text: None,
        }
    }

    #[test]
    fn test_load_image_sizes_mask() {
        let session = loaded(30, 20);
        assert!(session.has_image());
        assert_eq!(session.brush().surface().width(), 30);
        assert_eq!(session.brush().surface().height(), 20);
        assert_eq!(session.mode(), EditMode::Global);
    }

    #[test]
    fn test_load_failure_keeps_state() {
        let mut session = loaded(4, 4);
        let mut adj = Adjustments::default();
        adj.brightness = 120.0;
        session.set_adjustments(adj);

        let err = session.load_image(&[1, 2, 3], "image/png").unwrap_err();
        assert!(matches!(err, SessionError::Decode(_)));
        assert_eq!(session.source().unwrap().width, 4);
        assert_eq!(session.adjustments().brightness, 120.0);
    }

    #[test]
    fn test_new_image_resets_adjustments_and_mask() {
        let mut session = loaded(10, 10);
        let mut adj = Adjustments::default();
        adj.contrast = 150.0;
        session.set_adjustments(adj);
        session.set_mode(EditMode::Mask);
        session.pointer_down(&rect(10, 10), 5.0, 5.0);
        session.pointer_up();
        assert!(session.mask().is_some());

        session
            .load_image(&png_bytes(8, 6, [0, 0, 0, 255]), "image/png")
            .unwrap();
        assert_eq!(session.adjustments(), &Adjustments::default());
        assert!(session.mask().is_none());
        assert!(session.brush().surface().is_blank());
        assert_eq!(session.brush().surface().width(), 8);
    }

    #[test]
    fn test_reset_replaces_wholesale() {
        let mut session = loaded(4, 4);
        let mut adj = Adjustments::default();
        adj.saturation = 10.0;
        adj.curves.r = Curve::new(vec![CurvePoint::new(0.0, 40.0), CurvePoint::new(255.0, 255.0)])
            .unwrap();
        session.set_adjustments(adj);
        session.set_brush_settings(BrushSettings {
            size: 90.0,
            ..BrushSettings::default()
        });
        session.set_aspect_ratio(AspectRatio::Original);

        session.reset();
        assert_eq!(session.adjustments(), &Adjustments::default());
        assert!(session.luts().is_identity());
        assert_eq!(session.brush_settings(), &BrushSettings::default());
        assert_eq!(session.aspect_ratio(), AspectRatio::Square);
        assert!(session.has_image());
    }

    #[test]
    fn test_set_adjustments_clamps_and_rebuilds_luts() {
        let mut session = loaded(2, 2);
        let mut adj = Adjustments::default();
        adj.brightness = 999.0;
        adj.curves.g = Curve::new(vec![CurvePoint::new(0.0, 255.0), CurvePoint::new(255.0, 0.0)])
            .unwrap();
        session.set_adjustments(adj);

        assert_eq!(session.adjustments().brightness, 200.0);
        assert_eq!(session.luts().g.map(0), 255);
    }

    #[test]
    fn test_curve_gestures_rebuild_lut() {
        let mut session = loaded(2, 2);
        let canvas = DisplayRect::new(0.0, 0.0, 256.0, 256.0);
        session.set_active_channel(Channel::Blue);

        // Click at curve (64, 200): client y = 256 - 200.
        assert!(session.curve_press(&canvas, 64.0, 56.0, PointerButton::Primary, false));
        assert_eq!(session.adjustments().curves.b.len(), 3);
        assert_eq!(session.luts().b.map(64), 200);
        assert!(session.luts().rgb.is_identity());

        assert!(session.curve_drag(&canvas, 64.0, 156.0));
        assert_eq!(session.luts().b.map(64), 100);

        session.curve_release();
        assert!(!session.curve_drag(&canvas, 10.0, 10.0));

        // Secondary press on the point deletes it again.
        assert!(session.curve_press(&canvas, 64.0, 156.0, PointerButton::Secondary, false));
        assert!(session.luts().b.is_identity());
    }

    #[test]
    fn test_preview_renders_latest() {
        let mut session = loaded(3, 3);
        let mut adj = Adjustments::default();
        adj.brightness = 150.0;
        session.set_adjustments(adj.clone());
        adj.brightness = 50.0;
        session.set_adjustments(adj);

        let frame = session.render_preview().unwrap();
        assert!(session.is_preview_current(frame.generation));
        assert_eq!(frame.image.pixel(1, 1), Some([64, 64, 64, 255]));
        assert!(session.render_preview().is_none());
    }

    #[test]
    fn test_bake_uses_source_mime() {
        let mut session = EditSession::new();
        let jpeg = encode_image(&ImageRaster::filled(6, 6, [100, 100, 100, 255], ImageFormat::Jpeg))
            .unwrap();
        session.load_image(&jpeg, "image/jpeg").unwrap();

        let baked = session.bake().unwrap();
        assert_eq!(baked.mime, "image/jpeg");
        assert_eq!(&baked.bytes[0..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn test_bake_applies_adjustments() {
        let mut session = loaded(4, 4);
        let mut adj = Adjustments::default();
        adj.brightness = 150.0;
        session.set_adjustments(adj);

        let baked = session.bake().unwrap();
        let decoded = decode_image(&baked.bytes, &baked.mime).unwrap();
        assert_eq!(decoded.pixel(0, 0), Some([192, 192, 192, 255]));
    }

    #[test]
    fn test_bake_without_image() {
        assert!(matches!(
            EditSession::new().bake(),
            Err(SessionError::NoImage)
        ));
    }

    #[test]
    fn test_painting_requires_mask_mode() {
        let mut session = loaded(20, 20);
        assert!(!session.pointer_down(&rect(20, 20), 10.0, 10.0));
        assert!(session.brush().surface().is_blank());

        session.set_mode(EditMode::Mask);
        assert!(session.pointer_down(&rect(20, 20), 10.0, 10.0));
        session.pointer_move(&rect(20, 20), 15.0, 10.0);
        session.pointer_up();
        let mask = session.mask().unwrap();
        assert_eq!((mask.width, mask.height), (20, 20));
        assert!(mask.pixel(12, 10).unwrap()[3] > 0);
    }

    #[test]
    fn test_pointer_mapping_uses_display_scale() {
        let mut session = loaded(200, 100);
        session.set_mode(EditMode::Mask);
        session.set_brush_settings(BrushSettings {
            size: 4.0,
            hardness: 1.0,
            ..BrushSettings::default()
        });

        // Displayed at half size, offset by (10, 10).
        let display = DisplayRect::new(10.0, 10.0, 100.0, 50.0);
        session.pointer_down(&display, 60.0, 35.0);
        session.pointer_leave();

        let surface = session.brush().surface();
        assert_eq!(surface.coverage(100, 50), 1.0);
        assert_eq!(surface.coverage(50, 25), 0.0);
    }

    #[test]
    fn test_reentering_mask_mode_clears_mask() {
        let mut session = loaded(10, 10);
        session.set_mode(EditMode::Mask);
        session.pointer_down(&rect(10, 10), 5.0, 5.0);
        session.pointer_up();
        assert!(session.mask().is_some());

        session.set_mode(EditMode::Global);
        assert!(session.mask().is_some());
        session.set_mode(EditMode::Mask);
        assert!(session.mask().is_none());
        assert!(session.brush().surface().is_blank());
    }

    #[test]
    fn test_repeated_mask_mode_keeps_mask() {
        let mut session = loaded(10, 10);
        session.set_mode(EditMode::Mask);
        session.pointer_down(&rect(10, 10), 5.0, 5.0);
        session.pointer_up();

        session.set_mode(EditMode::Mask);
        assert!(session.mask().is_some());
        assert!(!session.brush().surface().is_blank());
    }

    #[test]
    fn test_leaving_mask_mode_ends_stroke() {
        let mut session = loaded(40, 10);
        session.set_mode(EditMode::Mask);
        session.set_brush_settings(BrushSettings {
            size: 4.0,
            hardness: 1.0,
            ..BrushSettings::default()
        });
        session.pointer_down(&rect(40, 10), 5.0, 5.0);

        session.set_mode(EditMode::Global);
        assert!(!session.brush().is_drawing());
        assert_eq!(session.mask().unwrap().pixel(5, 5).unwrap()[3], 255);

        session.pointer_move(&rect(40, 10), 35.0, 5.0);
        assert_eq!(session.brush().surface().coverage(35, 5), 0.0);
    }

    #[test]
    fn test_mask_png_export() {
        let mut session = loaded(10, 10);
        assert!(session.mask_png().unwrap().is_none());

        session.set_mode(EditMode::Mask);
        session.set_brush_settings(BrushSettings {
            size: 4.0,
            hardness: 1.0,
            ..BrushSettings::default()
        });
        session.pointer_down(&rect(10, 10), 5.0, 5.0);
        session.pointer_up();

        let png = session.mask_png().unwrap().unwrap();
        let decoded = decode_image(&png, "image/png").unwrap();
        assert_eq!(decoded.pixel(5, 5), Some([255, 255, 255, 255]));
        assert_eq!(decoded.pixel(0, 9).unwrap()[3], 0);
    }

    #[test]
    fn test_prepare_edit_validation() {
        let session = EditSession::new();
        assert!(matches!(
            session.prepare_edit("make it blue"),
            Err(SessionError::NoImage)
        ));

        let mut session = loaded(4, 4);
        assert!(matches!(
            session.prepare_edit("   "),
            Err(SessionError::EmptyPrompt)
        ));

        session.set_mode(EditMode::Mask);
        assert!(matches!(
            session.prepare_edit("make it blue"),
            Err(SessionError::MissingMask)
        ));
    }

    #[test]
    fn test_prepare_edit_wraps_prompt() {
        let mut session = loaded(4, 4);
        let request = session.prepare_edit("add a hat").unwrap();
        assert_eq!(
            request.prompt,
            "Please ensure the final image has an aspect ratio of 1:1. Then, fulfill this request: \"add a hat\""
        );
        assert_eq!(request.image.mime, "image/png");
        assert!(request.mask.is_none());

        session.set_aspect_ratio(AspectRatio::Original);
        assert_eq!(session.prepare_edit("add a hat").unwrap().prompt, "add a hat");
    }

    #[test]
    fn test_prepare_edit_attaches_mask_only_in_mask_mode() {
        let mut session = loaded(10, 10);
        session.set_mode(EditMode::Mask);
        session.pointer_down(&rect(10, 10), 5.0, 5.0);
        session.pointer_up();

        let request = session.prepare_edit("remove it").unwrap();
        let mask = request.mask.unwrap();
        assert_eq!(mask.mime, "image/png");

        session.set_mode(EditMode::Global);
        assert!(session.prepare_edit("remove it").unwrap().mask.is_none());
    }

    #[test]
    fn test_generate_stores_result() {
        let mut session = loaded(4, 4);
        let mut service = MockService {
            response: EditResponse {
                image: image_response().image,
                text: Some("done".to_string()),
            },
            ..MockService::default()
        };

        session.generate(&mut service, "make it red").unwrap();
        assert_eq!(service.requests.len(), 1);
        assert!(session.edited_image().is_some());
        assert_eq!(session.response_text(), Some("done"));
        assert!(!session.is_upscaled());
    }

    #[test]
    fn test_generate_empty_response_is_no_result() {
        let mut session = loaded(4, 4);
        let mut service = MockService::default();
        assert!(matches!(
            session.generate(&mut service, "anything"),
            Err(SessionError::NoResult)
        ));
        assert!(session.edited_image().is_none());
    }

    #[test]
    fn test_generate_text_only_is_ok() {
        let mut session = loaded(4, 4);
        let mut service = MockService {
            response: EditResponse {
                image: None,
                text: Some("I cannot do that".to_string()),
            },
            ..MockService::default()
        };
        session.generate(&mut service, "anything").unwrap();
        assert!(session.edited_image().is_none());
        assert_eq!(session.response_text(), Some("I cannot do that"));
    }

    #[test]
    fn test_generate_service_failure() {
        let mut session = loaded(4, 4);
        let mut service = MockService {
            fail: true,
            ..MockService::default()
        };
        match session.generate(&mut service, "anything") {
            Err(SessionError::Collaborator(msg)) => assert_eq!(msg, "quota exceeded"),
            other => panic!("expected collaborator error, got {:?}", other),
        }
    }

    #[test]
    fn test_generate_validation_skips_service() {
        let mut session = loaded(4, 4);
        session.set_mode(EditMode::Mask);
        let mut service = MockService::default();
        assert!(session.generate(&mut service, "x").is_err());
        assert!(service.requests.is_empty());
    }

    #[test]
    fn test_enhance_prompt_trims() {
        let mut session = EditSession::new();
        let mut service = MockService::default();
        assert_eq!(
            session.enhance_prompt(&mut service, "cat").unwrap(),
            "a vivid cat"
        );
        assert!(matches!(
            session.enhance_prompt(&mut service, ""),
            Err(SessionError::EmptyPrompt)
        ));
    }

    #[test]
    fn test_upscale_once() {
        let mut session = loaded(4, 4);
        let mut service = MockService {
            response: image_response(),
            upscaled: Some(EncodedImage {
                bytes: png_bytes(8, 8, [255, 0, 0, 255]),
                mime: "image/png".to_string(),
            }),
            ..MockService::default()
        };

        assert!(matches!(
            session.upscale(&mut service),
            Err(SessionError::NoImage)
        ));

        session.generate(&mut service, "go").unwrap();
        session.upscale(&mut service).unwrap();
        assert!(session.is_upscaled());
        assert!(matches!(
            session.upscale(&mut service),
            Err(SessionError::AlreadyUpscaled)
        ));

        // A new edit clears the upscaled flag.
        session.generate(&mut service, "again").unwrap();
        assert!(!session.is_upscaled());
    }

    #[test]
    fn test_upscale_without_image_result() {
        let mut session = loaded(4, 4);
        let mut service = MockService {
            response: image_response(),
            ..MockService::default()
        };
        session.generate(&mut service, "go").unwrap();
        assert!(matches!(
            session.upscale(&mut service),
            Err(SessionError::NoResult)
        ));
        assert!(!session.is_upscaled());
    }

    #[test]
    fn test_composite_result_restricts_to_mask() {
        let mut session = loaded(20, 20);
        assert!(session.composite_result().unwrap().is_none());

        session.set_mode(EditMode::Mask);
        session.set_brush_settings(BrushSettings {
            size: 6.0,
            hardness: 1.0,
            mode: BrushMode::Paint,
            ..BrushSettings::default()
        });
        session.pointer_down(&rect(20, 20), 5.0, 5.0);
        session.pointer_up();

        session
            .accept_edit_response(EditResponse {
                image: Some(EncodedImage {
                    bytes: png_bytes(20, 20, [255, 0, 0, 255]),
                    mime: "image/png".to_string(),
                }),
                text: None,
            })
            .unwrap();

        let out = session.composite_result().unwrap().unwrap();
        assert_eq!(out.pixel(5, 5), Some([255, 0, 0, 255]));
        assert_eq!(out.pixel(15, 15), Some([128, 128, 128, 255]));
    }

    #[test]
    fn test_aspect_ratio_labels() {
        for ratio in AspectRatio::ALL {
            assert_eq!(AspectRatio::from_label(ratio.label()), Some(ratio));
        }
        assert_eq!(
            serde_json::to_string(&AspectRatio::Landscape).unwrap(),
            "\"16:9\""
        );
        assert_eq!(AspectRatio::from_label("2:1"), None);
    }

    #[test]
    fn test_edit_mode_serde() {
        assert_eq!(serde_json::to_string(&EditMode::Mask).unwrap(), "\"mask\"");
    }

    #[test]
    fn test_close_image() {
        let mut session = loaded(4, 4);
        session.close_image();
        assert!(!session.has_image());
        assert!(session.render_preview().is_none());
    }
}
