//! Layer Compositor - Ordered Stacking of Preview Layers
//!
//! Draw order is array order: first layer at the bottom, last on top.
//! A layer id without a URL is skipped and takes no stacking slot.

use base64::Engine;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// z-index of the bottom surface.
pub const BASE_Z_INDEX: u32 = 10;

/// Edge length of the preview frame, in pixels.
pub const CANVAS_SIZE: u32 = 280;

/// Ordered layer ids plus the resolved URL of each.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewResult {
    pub layers: Vec<String>,
    #[serde(default)]
    pub urls: BTreeMap<String, String>,
}

impl PreviewResult {
    /// Layer ids that have no URL and will not be drawn.
    pub fn missing_urls(&self) -> Vec<&str> {
        self.layers
            .iter()
            .filter(|id| !self.urls.contains_key(id.as_str()))
            .map(String::as_str)
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Surface {
    pub layer: String,
    pub url: String,
    pub z_index: u32,
}

/// A full stack of surfaces, bottom first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Composition {
    pub surfaces: Vec<Surface>,
}

impl Composition {
    pub fn from_preview(preview: &PreviewResult) -> Self {
        let surfaces = preview
            .layers
            .iter()
            .filter_map(|id| preview.urls.get(id).map(|url| (id, url)))
            .enumerate()
            .map(|(position, (id, url))| Surface {
                layer: id.clone(),
                url: url.clone(),
                z_index: BASE_Z_INDEX + position as u32,
            })
            .collect();
        Self { surfaces }
    }

    pub fn is_empty(&self) -> bool {
        self.surfaces.is_empty()
    }

    pub fn top(&self) -> Option<&Surface> {
        self.surfaces.last()
    }

    pub fn layer_ids(&self) -> Vec<&str> {
        self.surfaces.iter().map(|s| s.layer.as_str()).collect()
    }

    /// Render as an SVG document, one full-frame `<image>` per surface in draw order.
    pub fn to_svg(&self, size: u32) -> String {
        let mut out = format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{0}" height="{0}" viewBox="0 0 {0} {0}">"#,
            size
        );
        for surface in &self.surfaces {
            out.push_str(&format!(
                r#"<image data-layer="{}" href="{}" x="0" y="0" width="{2}" height="{2}"/>"#,
                html_escape::encode_double_quoted_attribute(&surface.layer),
                html_escape::encode_double_quoted_attribute(&surface.url),
                size
            ));
        }
        out.push_str("</svg>");
        out
    }

    pub fn to_data_uri(&self, size: u32) -> String {
        let encoded = base64::engine::general_purpose::STANDARD.encode(self.to_svg(size));
        format!("data:image/svg+xml;base64,{}", encoded)
    }

    pub fn write_svg(&self, path: &Path, size: u32) -> std::io::Result<()> {
        fs::write(path, self.to_svg(size))
    }
}

/// Render target holding the currently displayed stack.
///
/// Each render replaces the previous surfaces wholesale.
#[derive(Debug, Default)]
pub struct LayerCanvas {
    current: Composition,
    renders: u64,
}

impl LayerCanvas {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn render(&mut self, preview: &PreviewResult) -> &Composition {
        self.current = Composition::from_preview(preview);
        self.renders += 1;
        &self.current
    }

    pub fn clear(&mut self) {
        self.current = Composition::default();
    }

    pub fn surfaces(&self) -> &[Surface] {
        &self.current.surfaces
    }

    pub fn composition(&self) -> &Composition {
        &self.current
    }

    pub fn render_count(&self) -> u64 {
        self.renders
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn preview(layers: &[&str], urls: &[(&str, &str)]) -> PreviewResult {
        PreviewResult {
            layers: layers.iter().map(|s| s.to_string()).collect(),
            urls: urls
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    #[test]
    fn test_stacks_in_list_order() {
        let p = preview(
            &["base", "pattern", "hair"],
            &[("hair", "u3"), ("base", "u1"), ("pattern", "u2")],
        );
        let c = Composition::from_preview(&p);
        assert_eq!(c.layer_ids(), vec!["base", "pattern", "hair"]);
        assert_eq!(c.top().unwrap().layer, "hair");
        let z: Vec<_> = c.surfaces.iter().map(|s| s.z_index).collect();
        assert_eq!(z, vec![10, 11, 12]);
    }

    #[test]
    fn test_missing_url_takes_no_slot() {
        let p = preview(&["base", "pattern", "eyes"], &[("base", "u1"), ("eyes", "u3")]);
        let c = Composition::from_preview(&p);
        assert_eq!(c.layer_ids(), vec!["base", "eyes"]);
        assert_eq!(c.surfaces[1].z_index, 11);
        assert_eq!(p.missing_urls(), vec!["pattern"]);
    }

    #[test]
    fn test_unlisted_urls_are_not_drawn() {
        let p = preview(&["base"], &[("base", "u1"), ("ghost", "u9")]);
        assert_eq!(Composition::from_preview(&p).layer_ids(), vec!["base"]);
    }

    #[test]
    fn test_svg_escapes_and_orders() {
        let p = preview(&["body", "eyes"], &[("body", "a.svg?x=1&y=2"), ("eyes", "b.svg")]);
        let svg = Composition::from_preview(&p).to_svg(CANVAS_SIZE);
        assert!(svg.contains("a.svg?x=1&amp;y=2"));
        let body = svg.find("body").unwrap();
        let eyes = svg.find("data-layer=\"eyes\"").unwrap();
        assert!(body < eyes);
        assert!(svg.ends_with("</svg>"));
    }

    #[test]
    fn test_quote_in_url_cannot_break_attribute() {
        let p = preview(&["body"], &[("body", r#"u1" onload="x"#)]);
        let svg = Composition::from_preview(&p).to_svg(CANVAS_SIZE);
        assert!(svg.contains("u1&quot; onload=&quot;x"));
        assert!(!svg.contains(r#"onload="x""#));
    }

    #[test]
    fn test_data_uri_prefix() {
        let uri = Composition::default().to_data_uri(CANVAS_SIZE);
        assert!(uri.starts_with("data:image/svg+xml;base64,"));
    }

    #[test]
    fn test_canvas_replaces_previous_render() {
        let mut canvas = LayerCanvas::new();
        canvas.render(&preview(&["body", "hair"], &[("body", "u1"), ("hair", "u2")]));
        assert_eq!(canvas.surfaces().len(), 2);

        canvas.render(&preview(&["body"], &[("body", "u5")]));
        assert_eq!(canvas.surfaces().len(), 1);
        assert_eq!(canvas.surfaces()[0].url, "u5");
        assert_eq!(canvas.render_count(), 2);
    }

    #[test]
    fn test_write_svg_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seal.svg");
        let c = Composition::from_preview(&preview(&["body"], &[("body", "u1")]));
        c.write_svg(&path, 64).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains(r#"width="64""#));
        assert!(written.contains(r#"href="u1""#));
    }
}
