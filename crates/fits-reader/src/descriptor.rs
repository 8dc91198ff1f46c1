use fits_hdu::block::has_magic;

use crate::catalog::{ExtensionCatalog, ExtensionInfo};
use crate::channel::ChannelSet;

/// Transfer function tag published to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorSpace {
    /// Linear float data, no transfer function applied.
    #[default]
    Linear,
}

/// Overall image shape and channel set, published once per file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageDescriptor {
    pub width: usize,
    pub height: usize,
    pub channels: ChannelSet,
    pub colorspace: ColorSpace,
}

impl ImageDescriptor {
    /// Size from `primary`, channels from the whole catalog.
    ///
    /// Extensions with a different size keep their own shape; rows outside
    /// their bounds fail to decode.
    pub fn new(primary: &ExtensionInfo, catalog: &ExtensionCatalog) -> Self {
        for other in catalog.iter() {
            if other.size[..2] != primary.size[..2] {
                log::warn!(
                    "{} is {}x{} but the image is {}x{} (from {})",
                    other.channel,
                    other.width(),
                    other.height(),
                    primary.width(),
                    primary.height(),
                    primary.channel
                );
            }
        }
        ImageDescriptor {
            width: primary.width(),
            height: primary.height(),
            channels: catalog.channels(),
            colorspace: ColorSpace::Linear,
        }
    }

    /// Number of channels, one per catalogued extension.
    pub fn depth(&self) -> usize {
        self.channels.len()
    }
}

/// Registration record of the file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Format {
    /// File extensions handled, without the dot.
    pub extensions: &'static [&'static str],
    pub label: &'static str,
}

pub const FORMAT: Format = Format {
    extensions: &["fits"],
    label: "fits file reader",
};

impl Format {
    /// See [`sniff`].
    pub fn test(&self, block: &[u8]) -> bool {
        sniff(block)
    }
}

/// Returns `true` if the first bytes of a file identify it as FITS.
pub fn sniff(block: &[u8]) -> bool {
    has_magic(block)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::ReaderOptions;
    use crate::sink::Reporter;
    use crate::source::mock::{MockHdu, MockSource};

    #[test]
    fn size_from_primary_channels_from_all() {
        let mut source = MockSource::new(vec![
            MockHdu::image("B", 10, 12, 0.0),
            MockHdu::image("A", 3, 4, 0.0),
        ]);
        let catalog =
            ExtensionCatalog::build(&mut source, &ReaderOptions::default(), Reporter::silent())
                .unwrap();
        let primary = catalog.iter().next().unwrap();
        let info = ImageDescriptor::new(primary, &catalog);
        assert_eq!((info.width, info.height), (10, 12));
        assert_eq!(info.depth(), 2);
        assert_eq!(info.colorspace, ColorSpace::Linear);
        assert!(info.channels.iter().any(|c| c.as_str() == "A.r"));
    }

    #[test]
    fn sniff_matches_magic_only() {
        assert!(sniff(b"SIMPLE  =                    T"));
        assert!(FORMAT.test(b"SIMPLE"));
        assert!(!sniff(b"XTENSION= 'IMAGE'"));
        assert!(!sniff(b"SIMP"));
        assert!(!sniff(b""));
    }

    #[test]
    fn format_registration() {
        assert_eq!(FORMAT.extensions, &["fits"]);
        assert_eq!(FORMAT.label, "fits file reader");
    }
}
