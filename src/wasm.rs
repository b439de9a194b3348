//! Browser bindings.
//!
//! `ThemeExtractor` exposes the staged pipeline so the page can yield to its
//! event loop between stages:
//!
//! ```js
//! const ex = new ThemeExtractor();
//! ex.start(imageData.data, imageData.width, imageData.height, 16, 16, 256);
//! while (!ex.step()) {
//!   progress.textContent = ex.stage();
//!   await new Promise(requestAnimationFrame);
//! }
//! ```

use js_sys::{Array, Object, Reflect, Uint8Array, Uint32Array};
use rand::{SeedableRng, rngs::StdRng};
use wasm_bindgen::prelude::*;

use crate::error::ThemeError;
use crate::pipeline::{self, Extractor, Options, Poll};
use crate::rank::PaletteEntry;
use crate::{decode_rgba, encode_png};

fn to_js(err: ThemeError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn rng_for(seed: Option<u64>) -> StdRng {
    let seed = seed.unwrap_or_else(|| (js_sys::Math::random() * u64::MAX as f64) as u64);
    StdRng::seed_from_u64(seed)
}

fn options(k: usize, max_iterations: usize, sample_cap: u32) -> Options {
    Options {
        k,
        max_iterations,
        sample_cap,
        ..Options::default()
    }
}

fn palette_array(palette: &[PaletteEntry]) -> Array {
    palette.iter().map(|e| JsValue::from_str(&e.hex())).collect()
}

fn weights_array(palette: &[PaletteEntry]) -> Uint32Array {
    let weights: Vec<u32> = palette.iter().map(|e| e.weight as u32).collect();
    Uint32Array::from(weights.as_slice())
}

/// Resumable extractor holding the last published palette and image.
#[wasm_bindgen]
pub struct ThemeExtractor {
    inner: Extractor<StdRng>,
    width: u32,
    height: u32,
}

#[wasm_bindgen]
impl ThemeExtractor {
    #[wasm_bindgen(constructor)]
    pub fn new() -> ThemeExtractor {
        ThemeExtractor {
            inner: Extractor::new(),
            width: 0,
            height: 0,
        }
    }

    /// Start a run over raw RGBA pixels, replacing any run still in flight.
    /// Invalid options or a mis-sized buffer throw immediately.
    pub fn start(
        &mut self,
        pixels: Vec<u8>,
        width: u32,
        height: u32,
        k: usize,
        max_iterations: usize,
        sample_cap: u32,
        seed: Option<u64>,
    ) -> Result<(), JsValue> {
        let img = pipeline::pixel_buffer(width, height, pixels).map_err(to_js)?;
        self.inner
            .start(img, options(k, max_iterations, sample_cap), rng_for(seed))
            .map_err(to_js)?;
        self.width = width;
        self.height = height;
        Ok(())
    }

    /// Run one stage. Returns `true` once the run is over, whether it
    /// published, came up empty, or failed.
    pub fn step(&mut self) -> bool {
        !matches!(self.inner.poll(), Poll::Pending(_))
    }

    /// Name of the stage the next `step` will run, if any.
    pub fn stage(&self) -> Option<String> {
        self.inner.stage().map(|s| s.to_string())
    }

    #[wasm_bindgen(getter)]
    pub fn running(&self) -> bool {
        self.inner.is_running()
    }

    /// Message of the last failed run.
    #[wasm_bindgen(getter)]
    pub fn error(&self) -> Option<String> {
        self.inner.failure().map(|e| e.to_string())
    }

    /// Published palette as `#rrggbb` strings, most dominant first.
    #[wasm_bindgen(getter)]
    pub fn palette(&self) -> Array {
        self.inner
            .published()
            .map(|x| palette_array(&x.palette))
            .unwrap_or_else(Array::new)
    }

    #[wasm_bindgen(getter)]
    pub fn weights(&self) -> Uint32Array {
        self.inner
            .published()
            .map(|x| weights_array(&x.palette))
            .unwrap_or_else(|| Uint32Array::new_with_length(0))
    }

    /// Recolored RGBA pixels of the published run.
    #[wasm_bindgen(getter)]
    pub fn pixels(&self) -> Option<Vec<u8>> {
        self.inner.published().map(|x| x.image.as_raw().clone())
    }

    #[wasm_bindgen(getter)]
    pub fn width(&self) -> u32 {
        self.inner.published().map_or(self.width, |x| x.image.width())
    }

    #[wasm_bindgen(getter)]
    pub fn height(&self) -> u32 {
        self.inner.published().map_or(self.height, |x| x.image.height())
    }
}

impl Default for ThemeExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// One-shot extraction over an encoded image.
///
/// Returns `{ image, palette, weights }`: a PNG `Uint8Array` of the recolored
/// image, hex strings ordered by dominance, and their sample counts. An image
/// without opaque pixels yields an empty palette and the decoded source.
#[wasm_bindgen]
pub fn extract_theme(
    input: Vec<u8>,
    k: usize,
    max_iterations: usize,
    sample_cap: u32,
    seed: Option<u64>,
) -> Result<Object, JsValue> {
    let opts = options(k, max_iterations, sample_cap);
    opts.validate().map_err(to_js)?;
    let img = decode_rgba(&input).map_err(to_js)?;
    let extraction = pipeline::run(img, opts, rng_for(seed)).map_err(to_js)?;
    let png = encode_png(&extraction.image).map_err(to_js)?;

    let result = Object::new();
    Reflect::set(&result, &JsValue::from_str("image"), &Uint8Array::from(png.as_slice()))?;
    Reflect::set(&result, &JsValue::from_str("palette"), &palette_array(&extraction.palette))?;
    Reflect::set(&result, &JsValue::from_str("weights"), &weights_array(&extraction.palette))?;
    Ok(result)
}

/// Recolor an encoded image against a curated palette of hex strings and
/// return it as PNG.
#[wasm_bindgen]
pub fn remap_palette(input: Vec<u8>, palette: Array) -> Result<Uint8Array, JsValue> {
    let hex = palette
        .iter()
        .map(|v| {
            v.as_string()
                .ok_or_else(|| JsValue::from_str("Palette values must be strings"))
        })
        .collect::<Result<Vec<String>, JsValue>>()?;
    let img = decode_rgba(&input).map_err(to_js)?;
    let out = crate::remap_palette(&img, &hex).map_err(to_js)?;
    let png = encode_png(&out).map_err(to_js)?;
    Ok(Uint8Array::from(png.as_slice()))
}

/// Rotate the hue of an encoded image by `degrees` and return it as PNG.
#[wasm_bindgen]
pub fn shift_hue(input: Vec<u8>, degrees: f32) -> Result<Uint8Array, JsValue> {
    let mut img = decode_rgba(&input).map_err(to_js)?;
    crate::hue::shift_hue_in_place(&mut img, degrees).map_err(to_js)?;
    let png = encode_png(&img).map_err(to_js)?;
    Ok(Uint8Array::from(png.as_slice()))
}

/// WCAG contrast ratio between two hex colors.
#[wasm_bindgen]
pub fn contrast_ratio(fg: &str, bg: &str) -> Result<f64, JsValue> {
    let fg = crate::color::parse_hex(fg).map_err(to_js)?;
    let bg = crate::color::parse_hex(bg).map_err(to_js)?;
    Ok(crate::contrast::contrast_ratio(fg, bg))
}
