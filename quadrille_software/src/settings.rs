// Copyright 2026 the Quadrille Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Renderer configuration.

use quadrille_core::color::Color;

/// Supplies trace timestamps in nanoseconds from a caller-chosen origin.
///
/// The renderer never reads a clock itself; timestamps only reach
/// [`Tracer`](quadrille_core::trace::Tracer) events.
pub type TimeSource = fn() -> u64;

const fn zero_time() -> u64 {
    0
}

/// Configuration for the [`SoftwareRenderer`](crate::SoftwareRenderer).
#[derive(Clone, Copy, Debug)]
pub struct RendererSettings {
    /// Permit anti-aliased quad edges at all.
    pub allow_antialiasing: bool,
    /// Anti-alias every quad, even axis-aligned ones on pixel boundaries.
    pub force_antialiasing: bool,
    /// Clear the root pass before drawing it.
    pub should_clear_root_render_pass: bool,
    /// Limit root pass drawing to its damage rect.
    pub partial_swap_enabled: bool,
    /// Clear color for opaque passes in debug builds; makes undrawn areas
    /// visible.
    pub debug_clear_color: Color,
    /// Run overlay promotion before drawing.
    pub enable_overlays: bool,
    /// Timestamp source for trace events.
    pub time_source: TimeSource,
}

impl RendererSettings {
    /// Settings for interactive compositing.
    #[must_use]
    pub const fn standard() -> Self {
        Self {
            allow_antialiasing: true,
            force_antialiasing: false,
            should_clear_root_render_pass: true,
            partial_swap_enabled: false,
            debug_clear_color: Color::BLUE,
            enable_overlays: false,
            time_source: zero_time,
        }
    }

    /// Settings for pixel comparison tests: no anti-aliasing, so output is
    /// exact on every platform.
    #[must_use]
    pub const fn pixel_tests() -> Self {
        Self {
            allow_antialiasing: false,
            ..Self::standard()
        }
    }

    /// Returns these settings with a different time source.
    #[must_use]
    pub const fn with_time_source(mut self, time_source: TimeSource) -> Self {
        self.time_source = time_source;
        self
    }

    /// Current timestamp from the configured source.
    #[inline]
    #[must_use]
    pub fn now(&self) -> u64 {
        (self.time_source)()
    }
}

impl Default for RendererSettings {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pixel_tests_disable_antialiasing_only() {
        let standard = RendererSettings::standard();
        let pixel = RendererSettings::pixel_tests();
        assert!(standard.allow_antialiasing);
        assert!(!pixel.allow_antialiasing);
        assert_eq!(
            pixel.should_clear_root_render_pass, standard.should_clear_root_render_pass,
            "pixel tests keep root clearing"
        );
        assert_eq!(pixel.now(), 0);
    }

    #[test]
    fn custom_time_source() {
        let settings = RendererSettings::default().with_time_source(|| 42);
        assert_eq!(settings.now(), 42);
    }
}
