//! Preprocessing configuration and the text filter boundary.
//!
//! [`PreprocessConfig`] is a plain value: constructed once, read-only for the
//! lifetime of a pipeline instance. Filters inside it are typed
//! ([`FilterOp`]); the only place text meets filters is [`parse_filter`],
//! which translates the `"name"` / `"name:value"` tokens used by outer
//! configuration layers into the typed form exactly once.

use rasterpipe_core::FilterOp;

use crate::error::{PrepError, PrepResult};

/// ImageNet per-channel mean, the default normalization target.
pub const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
/// ImageNet per-channel standard deviation.
pub const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Number of channels in the output tensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OutputChannels {
    /// Single channel: the gray channel if grayscale was applied, otherwise
    /// the mean of R, G, B.
    Gray,
    /// R, G, B with alpha dropped.
    #[default]
    Rgb,
    /// Full RGBA.
    Rgba,
}

impl OutputChannels {
    /// Channel count as a plain number (1, 3, or 4).
    #[inline]
    pub fn count(self) -> usize {
        match self {
            OutputChannels::Gray => 1,
            OutputChannels::Rgb => 3,
            OutputChannels::Rgba => 4,
        }
    }
}

/// Element type of the output tensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OutputDtype {
    /// 32-bit float (default).
    #[default]
    F32,
    /// 16-bit float, narrowed from the f32 result.
    F16,
    /// Unsigned byte; if normalization ran, values are denormalized back to
    /// `[0, 255]` before the cast.
    U8,
}

/// Configuration for the preprocessing pipeline.
///
/// Mirrors the processing order of
/// [`Preprocessor::process`](crate::pipeline::Preprocessor::process):
/// filters, resize, grayscale, channel selection, normalization, dtype cast,
/// planar layout.
///
/// # Example
///
/// ```rust
/// use rasterpipe_prep::{OutputChannels, PreprocessConfig};
///
/// let config = PreprocessConfig {
///     target_size: Some((224, 224)),
///     output_channels: OutputChannels::Rgb,
///     ..PreprocessConfig::default()
/// };
/// assert!(config.normalize);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PreprocessConfig {
    /// Target `(width, height)`; `None` keeps the input size.
    pub target_size: Option<(u32, u32)>,
    /// Scale to `[0, 1]` and apply per-channel mean/std.
    pub normalize: bool,
    /// Per-channel normalization mean; only the first
    /// [`output_channels`](Self::output_channels) entries are used.
    pub mean: [f32; 3],
    /// Per-channel normalization standard deviation.
    pub std: [f32; 3],
    /// Filter chain, applied in order before resize.
    pub filters: Vec<FilterOp>,
    /// Apply grayscale after resize (the gray channel then feeds
    /// single-channel output directly).
    pub to_grayscale: bool,
    /// Output channel selection.
    pub output_channels: OutputChannels,
    /// Output element type.
    pub output_dtype: OutputDtype,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            target_size: None,
            normalize: true,
            mean: IMAGENET_MEAN,
            std: IMAGENET_STD,
            filters: Vec::new(),
            to_grayscale: false,
            output_channels: OutputChannels::Rgb,
            output_dtype: OutputDtype::F32,
        }
    }
}

/// Parses one filter token into a [`FilterOp`].
///
/// Accepted forms: `"grayscale"`, `"sharpen"`, `"edge_detect"`, `"invert"`,
/// `"sepia"`, and the parameterized `"brightness:V"`, `"contrast:V"`,
/// `"blur:V"` with `V` a float.
///
/// # Errors
///
/// Returns [`PrepError::UnknownFilter`] for any other token, including a
/// known name with an unparseable value.
///
/// # Example
///
/// ```rust
/// use rasterpipe_prep::parse_filter;
/// use rasterpipe_core::FilterOp;
///
/// assert_eq!(parse_filter("brightness:0.5").unwrap(), FilterOp::Brightness(0.5));
/// assert!(parse_filter("foo").is_err());
/// ```
pub fn parse_filter(token: &str) -> PrepResult<FilterOp> {
    match token {
        "grayscale" => return Ok(FilterOp::Grayscale),
        "sharpen" => return Ok(FilterOp::Sharpen),
        "edge_detect" => return Ok(FilterOp::EdgeDetect),
        "invert" => return Ok(FilterOp::Invert),
        "sepia" => return Ok(FilterOp::Sepia),
        _ => {}
    }

    if let Some((name, value)) = token.split_once(':') {
        let value: f32 = value
            .parse()
            .map_err(|_| PrepError::UnknownFilter(token.to_string()))?;
        return match name {
            "brightness" => Ok(FilterOp::Brightness(value)),
            "contrast" => Ok(FilterOp::Contrast(value)),
            "blur" => Ok(FilterOp::Blur(value)),
            _ => Err(PrepError::UnknownFilter(token.to_string())),
        };
    }

    Err(PrepError::UnknownFilter(token.to_string()))
}

/// Parses a whole token chain, preserving order.
///
/// # Errors
///
/// Fails with [`PrepError::UnknownFilter`] on the first bad token.
pub fn parse_filters<S: AsRef<str>>(tokens: &[S]) -> PrepResult<Vec<FilterOp>> {
    tokens.iter().map(|t| parse_filter(t.as_ref())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bare_names() {
        assert_eq!(parse_filter("grayscale").unwrap(), FilterOp::Grayscale);
        assert_eq!(parse_filter("sharpen").unwrap(), FilterOp::Sharpen);
        assert_eq!(parse_filter("edge_detect").unwrap(), FilterOp::EdgeDetect);
        assert_eq!(parse_filter("invert").unwrap(), FilterOp::Invert);
        assert_eq!(parse_filter("sepia").unwrap(), FilterOp::Sepia);
    }

    #[test]
    fn test_parse_parameterized() {
        assert_eq!(
            parse_filter("brightness:0.5").unwrap(),
            FilterOp::Brightness(0.5)
        );
        assert_eq!(
            parse_filter("brightness:-0.25").unwrap(),
            FilterOp::Brightness(-0.25)
        );
        assert_eq!(parse_filter("contrast:1.2").unwrap(), FilterOp::Contrast(1.2));
        assert_eq!(parse_filter("blur:2").unwrap(), FilterOp::Blur(2.0));
    }

    #[test]
    fn test_parse_rejects_unknown_tokens() {
        for token in ["foo", "", "brightness", "brightness:abc", "foo:1.0", ":0.5"] {
            let err = parse_filter(token).unwrap_err();
            assert!(matches!(err, PrepError::UnknownFilter(_)), "{token}");
        }
    }

    #[test]
    fn test_parse_filters_preserves_order_and_fails_fast() {
        let ops = parse_filters(&["grayscale", "blur:1.5", "invert"]).unwrap();
        assert_eq!(
            ops,
            vec![FilterOp::Grayscale, FilterOp::Blur(1.5), FilterOp::Invert]
        );

        assert!(parse_filters(&["grayscale", "foo"]).is_err());
    }

    #[test]
    fn test_default_config_matches_imagenet() {
        let config = PreprocessConfig::default();
        assert!(config.normalize);
        assert_eq!(config.mean, IMAGENET_MEAN);
        assert_eq!(config.std, IMAGENET_STD);
        assert_eq!(config.output_channels, OutputChannels::Rgb);
        assert_eq!(config.output_dtype, OutputDtype::F32);
        assert!(config.filters.is_empty());
        assert!(config.target_size.is_none());
        assert!(!config.to_grayscale);
    }

    #[test]
    fn test_output_channels_count() {
        assert_eq!(OutputChannels::Gray.count(), 1);
        assert_eq!(OutputChannels::Rgb.count(), 3);
        assert_eq!(OutputChannels::Rgba.count(), 4);
    }
}
