//! Text rendering for the overlays and the HUD, built on glyphon.
//!
//! Each [`UiText`] in a frame owns a glyphon buffer keyed by its id. Buffers are created
//! on first sight, reshaped only when their text or size changes, and hidden when a frame
//! stops mentioning them.

use crate::ui::{UiFrame, UiText};
use glyphon::{
    Attrs, Buffer, Cache, Color, Family, FontSystem, Metrics, Resolution, Shaping, SwashCache,
    TextArea, TextAtlas, TextBounds, TextRenderer as GlyphonTextRenderer, Viewport, Weight,
};
use log::{debug, info};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use wgpu::{Device, MultisampleState, Queue, RenderPass};

/// Display face shipped with the game. Missing is fine; a system serif is used instead.
const DISPLAY_FONT_PATH: &str = "assets/fonts/Cinzel-Regular.ttf";
const DISPLAY_FONT_FAMILY: &str = "Cinzel";

/// Line height as a multiple of font size.
const LINE_HEIGHT: f32 = 1.3;

#[derive(Debug, Clone, PartialEq)]
pub struct TextStyle {
    pub font_size: f32,
    pub color: Color,
    pub weight: Weight,
}

impl TextStyle {
    fn of(text: &UiText) -> Self {
        let [r, g, b] = text.color;
        Self {
            font_size: text.font_size,
            color: Color::rgb(r, g, b),
            // titles are drawn large and bold
            weight: if text.font_size >= 30.0 {
                Weight::BOLD
            } else {
                Weight::NORMAL
            },
        }
    }

    fn metrics(&self) -> Metrics {
        Metrics::new(self.font_size, self.font_size * LINE_HEIGHT)
    }
}

#[derive(Debug)]
pub struct TextBuffer {
    pub buffer: Buffer,
    pub style: TextStyle,
    pub x: f32,
    pub y: f32,
    pub max_width: f32,
    pub visible: bool,
    pub text_content: String,
}

pub struct TextRenderer {
    pub font_system: FontSystem,
    pub swash_cache: SwashCache,
    pub viewport: Viewport,
    pub atlas: TextAtlas,
    pub text_renderer: GlyphonTextRenderer,
    pub text_buffers: HashMap<&'static str, TextBuffer>,
    pub window_size: (u32, u32),
    display_font: Option<&'static str>,
}

impl TextRenderer {
    pub fn new(
        device: &Device,
        queue: &Queue,
        surface_format: wgpu::TextureFormat,
        width: u32,
        height: u32,
    ) -> Self {
        let font_system = FontSystem::new();
        let swash_cache = SwashCache::new();
        let cache = Cache::new(device);
        let viewport = Viewport::new(device, &cache);
        let mut atlas = TextAtlas::new(device, queue, &cache, surface_format);
        let text_renderer = GlyphonTextRenderer::new(&mut atlas, device, MultisampleState::default(), None);

        let mut renderer = Self {
            font_system,
            swash_cache,
            viewport,
            atlas,
            text_renderer,
            text_buffers: HashMap::new(),
            window_size: (width, height),
            display_font: None,
        };

        match renderer.load_font(DISPLAY_FONT_PATH) {
            Ok(()) => {
                info!("Loaded font {} from {}", DISPLAY_FONT_FAMILY, DISPLAY_FONT_PATH);
                renderer.display_font = Some(DISPLAY_FONT_FAMILY);
            }
            Err(e) => info!("No display font at {} ({}), using system serif", DISPLAY_FONT_PATH, e),
        }
        renderer.resize(queue, width, height);

        renderer
    }

    pub fn load_font(&mut self, font_path: &str) -> Result<(), std::io::Error> {
        let font_data = fs::read(Path::new(font_path))?;
        self.font_system.db_mut().load_font_data(font_data);
        Ok(())
    }

    fn attrs(&self, style: &TextStyle) -> Attrs<'static> {
        let family = match self.display_font {
            Some(name) => Family::Name(name),
            None => Family::Serif,
        };
        Attrs::new().family(family).weight(style.weight)
    }

    fn create_text_buffer(&mut self, text: &UiText) {
        let style = TextStyle::of(text);
        let attrs = self.attrs(&style);
        let mut buffer = Buffer::new(&mut self.font_system, style.metrics());
        buffer.set_size(
            &mut self.font_system,
            Some(text.max_width),
            Some(self.window_size.1 as f32),
        );
        buffer.set_text(&mut self.font_system, &text.text, attrs, Shaping::Advanced);
        buffer.shape_until_scroll(&mut self.font_system, false);
        debug!("Created text buffer '{}'", text.id);

        self.text_buffers.insert(
            text.id,
            TextBuffer {
                buffer,
                style,
                x: text.x,
                y: text.y,
                max_width: text.max_width,
                visible: true,
                text_content: text.text.clone(),
            },
        );
    }

    fn update_text_buffer(&mut self, text: &UiText) {
        let style = TextStyle::of(text);
        let attrs = self.attrs(&style);
        let window_height = self.window_size.1 as f32;
        let Some(entry) = self.text_buffers.get_mut(text.id) else {
            return;
        };

        entry.visible = true;
        entry.x = text.x;
        entry.y = text.y;

        let mut reshape = false;
        if entry.style != style {
            if entry.style.font_size != style.font_size {
                entry.buffer.set_metrics(&mut self.font_system, style.metrics());
            }
            entry.style = style;
            reshape = true;
        }
        if entry.max_width != text.max_width {
            entry
                .buffer
                .set_size(&mut self.font_system, Some(text.max_width), Some(window_height));
            entry.max_width = text.max_width;
            reshape = true;
        }
        if entry.text_content != text.text {
            entry.text_content = text.text.clone();
            reshape = true;
        }

        if reshape {
            entry
                .buffer
                .set_text(&mut self.font_system, &entry.text_content, attrs, Shaping::Advanced);
            entry.buffer.shape_until_scroll(&mut self.font_system, false);
        }
    }

    /// Mirrors the texts of `frame`: new ids get buffers, changed ones are reshaped and
    /// ids absent from the frame are hidden.
    pub fn sync_frame(&mut self, frame: &UiFrame) {
        for buffer in self.text_buffers.values_mut() {
            buffer.visible = false;
        }
        for text in &frame.texts {
            if self.text_buffers.contains_key(text.id) {
                self.update_text_buffer(text);
            } else {
                self.create_text_buffer(text);
            }
        }
    }

    pub fn resize(&mut self, queue: &Queue, width: u32, height: u32) {
        self.window_size = (width, height);
        self.viewport.update(queue, Resolution { width, height });
    }

    /// Prepare text rendering for the current frame
    pub fn prepare(&mut self, device: &Device, queue: &Queue) -> Result<(), glyphon::PrepareError> {
        let (width, height) = self.window_size;
        let text_areas: Vec<TextArea> = self
            .text_buffers
            .values()
            .filter(|buffer| buffer.visible)
            .map(|buffer| TextArea {
                buffer: &buffer.buffer,
                left: buffer.x,
                top: buffer.y,
                scale: 1.0,
                bounds: TextBounds {
                    left: buffer.x as i32,
                    top: buffer.y as i32,
                    right: ((buffer.x + buffer.max_width) as i32).min(width as i32),
                    bottom: height as i32,
                },
                default_color: buffer.style.color,
                custom_glyphs: &[],
            })
            .collect();

        self.text_renderer.prepare(
            device,
            queue,
            &mut self.font_system,
            &mut self.atlas,
            &self.viewport,
            text_areas,
            &mut self.swash_cache,
        )
    }

    /// Render all visible text buffers
    pub fn render(&mut self, render_pass: &mut RenderPass) -> Result<(), glyphon::RenderError> {
        self.text_renderer.render(&self.atlas, &self.viewport, render_pass)
    }

    /// Trim the atlas to free up unused space
    pub fn trim(&mut self) {
        self.atlas.trim();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(font_size: f32) -> UiText {
        UiText {
            id: "t",
            text: "Keys: 0/4".to_string(),
            x: 0.0,
            y: 0.0,
            max_width: 200.0,
            font_size,
            color: [255, 213, 74],
        }
    }

    #[test]
    fn test_style_from_ui_text() {
        let style = TextStyle::of(&text(18.0));
        assert_eq!(style.color, Color::rgb(255, 213, 74));
        assert_eq!(style.weight, Weight::NORMAL);
        assert_eq!(TextStyle::of(&text(36.0)).weight, Weight::BOLD);
    }
}
