// Copyright 2026 the Regather Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-frame parameters for the aggregation computation.
//!
//! Aggregation runs during the update cycle rather than the draw cycle, so
//! the shader-module settings a draw would receive have to be assembled up
//! front. The framework passes its per-frame state explicitly as a
//! [`FrameContext`]; [`ModuleSettings`] bundles it with the current props and
//! is handed through unmodified. Nothing in this crate interprets these
//! values.

use kurbo::{Affine, Point};

use crate::snapshot::PropSnapshot;

/// Per-frame state owned by the rendering framework.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameContext {
    /// Viewport transform.
    pub viewport: Affine,
    /// Last known pointer position, if the pointer is over the canvas.
    pub pointer: Option<Point>,
    /// Width of the drawing buffer in device pixels.
    pub drawing_buffer_width: u32,
    /// Width of the canvas in CSS pixels.
    pub css_width: f64,
}

impl Default for FrameContext {
    fn default() -> Self {
        Self {
            viewport: Affine::IDENTITY,
            pointer: None,
            drawing_buffer_width: 1,
            css_width: 1.0,
        }
    }
}

/// Ratio between device pixels and CSS pixels.
///
/// Returns 1.0 when the CSS width is not a positive finite number.
#[must_use]
pub fn css_to_device_ratio(drawing_buffer_width: u32, css_width: f64) -> f64 {
    if css_width.is_finite() && css_width > 0.0 {
        f64::from(drawing_buffer_width) / css_width
    } else {
        1.0
    }
}

/// Shader-module settings for one aggregation pass.
#[derive(Clone, Copy, Debug)]
pub struct ModuleSettings<'a> {
    /// Props of the current cycle.
    pub props: &'a PropSnapshot,
    /// Viewport transform.
    pub viewport: Affine,
    /// Pointer position.
    pub pointer: Option<Point>,
    /// Always `false`: aggregation never renders into the picking buffer.
    pub picking_active: bool,
    /// Device pixels per CSS pixel.
    pub device_pixel_ratio: f64,
}

impl<'a> ModuleSettings<'a> {
    /// Assembles settings from the current props and frame context.
    #[must_use]
    pub fn from_context(props: &'a PropSnapshot, ctx: &FrameContext) -> Self {
        Self {
            props,
            viewport: ctx.viewport,
            pointer: ctx.pointer,
            picking_active: false,
            device_pixel_ratio: css_to_device_ratio(ctx.drawing_buffer_width, ctx.css_width),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ratio_of_buffer_to_css_width() {
        assert!((css_to_device_ratio(1600, 800.0) - 2.0).abs() < 1e-12);
        assert!((css_to_device_ratio(800, 800.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn ratio_falls_back_to_one() {
        assert!((css_to_device_ratio(1600, 0.0) - 1.0).abs() < 1e-12);
        assert!((css_to_device_ratio(1600, -5.0) - 1.0).abs() < 1e-12);
        assert!((css_to_device_ratio(1600, f64::NAN) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn settings_pass_context_through() {
        let props = PropSnapshot::new().with("cellSize", 10);
        let ctx = FrameContext {
            viewport: Affine::scale(2.0),
            pointer: Some(Point::new(4.0, 5.0)),
            drawing_buffer_width: 2048,
            css_width: 1024.0,
        };
        let settings = ModuleSettings::from_context(&props, &ctx);
        assert_eq!(settings.viewport, Affine::scale(2.0));
        assert_eq!(settings.pointer, Some(Point::new(4.0, 5.0)));
        assert!(!settings.picking_active);
        assert!((settings.device_pixel_ratio - 2.0).abs() < 1e-12);
        assert_eq!(settings.props.len(), 1);
    }
}
