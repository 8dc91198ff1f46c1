//! Discovery of 2-D image extensions and their mapping to channels.

use std::collections::HashMap;

use fits_hdu::HduType;

use crate::channel::{Channel, ChannelSet};
use crate::error::ReaderError;
use crate::options::{DuplicatePolicy, PrimarySelection, ReaderOptions, UnnamedPolicy};
use crate::sink::Reporter;
use crate::source::FitsSource;

/// Number of axis sizes read from each image header.
pub const MAX_AXES: usize = 3;

/// One 2-D image extension exposed as a channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionInfo {
    /// 1-based HDU position, used to reposition the file cursor.
    pub index: usize,
    pub name: String,
    pub channel: Channel,
    pub bitpix: i64,
    pub naxis: usize,
    /// NAXIS1..NAXIS3; unused axes are 0.
    pub size: [usize; MAX_AXES],
}

impl ExtensionInfo {
    pub fn width(&self) -> usize {
        self.size[0]
    }

    pub fn height(&self) -> usize {
        self.size[1]
    }
}

/// Channel-to-extension map, iterated in file order, immutable once built.
#[derive(Debug, Clone, Default)]
pub struct ExtensionCatalog {
    entries: Vec<ExtensionInfo>,
    by_channel: HashMap<Channel, usize>,
}

impl ExtensionCatalog {
    /// Scan every HDU of `source` and keep the named 2-D images.
    ///
    /// Problems with a single HDU only exclude that HDU. Failing to count
    /// the HDUs is fatal. The returned catalog may be empty; the caller
    /// decides whether that is an error.
    pub fn build<S: FitsSource>(
        source: &mut S,
        options: &ReaderOptions,
        reporter: Reporter<'_>,
    ) -> Result<Self, ReaderError> {
        let count = source.num_hdus().map_err(|e| {
            reporter.report("Error getting number of HDUs", &e);
            ReaderError::HduCount(e)
        })?;
        log::debug!("{}: {} HDUs", source.label(), count);

        let mut catalog = ExtensionCatalog::default();
        for index in 1..=count {
            if let Some(info) = inspect(source, index, options, reporter) {
                catalog.insert(info, options, reporter);
            }
        }
        Ok(catalog)
    }

    fn insert(&mut self, mut info: ExtensionInfo, options: &ReaderOptions, reporter: Reporter<'_>) {
        let Some(&existing) = self.by_channel.get(&info.channel) else {
            self.push(info);
            return;
        };

        match options.duplicates {
            DuplicatePolicy::Disambiguate => {
                // `name` keeps the declared EXTNAME; only the channel changes.
                let mut layer = info.name.clone();
                while self.by_channel.contains_key(&info.channel) {
                    layer = format!("{layer}_{}", info.index);
                    info.channel = Channel::new(&layer, &options.channel_suffix);
                }
                log::warn!(
                    "HDU {} duplicates channel of HDU {}, renamed to {}",
                    info.index,
                    self.entries[existing].index,
                    info.channel
                );
                self.push(info);
            }
            DuplicatePolicy::Overwrite => {
                log::warn!(
                    "HDU {} replaces HDU {} as channel {}",
                    info.index,
                    self.entries[existing].index,
                    info.channel
                );
                self.entries[existing] = info;
            }
            DuplicatePolicy::Reject => {
                let context = format!("Duplicate channel {} in HDU {}", info.channel, info.index);
                reporter.report_status(
                    &context,
                    &format!("already provided by HDU {}", self.entries[existing].index),
                    "duplicate channel name",
                );
            }
        }
    }

    fn push(&mut self, info: ExtensionInfo) {
        self.by_channel.insert(info.channel.clone(), self.entries.len());
        self.entries.push(info);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, channel: &Channel) -> Option<&ExtensionInfo> {
        self.by_channel.get(channel).map(|&i| &self.entries[i])
    }

    pub fn contains(&self, channel: &Channel) -> bool {
        self.by_channel.contains_key(channel)
    }

    /// Entries in the order their HDUs appear in the file.
    pub fn iter(&self) -> impl Iterator<Item = &ExtensionInfo> {
        self.entries.iter()
    }

    pub fn channels(&self) -> ChannelSet {
        self.entries.iter().map(|e| e.channel.clone()).collect()
    }

    /// The entry that defines the overall image size.
    pub fn primary(&self, selection: PrimarySelection) -> Option<&ExtensionInfo> {
        match selection {
            PrimarySelection::FirstScanned => self.entries.first(),
            PrimarySelection::LowestChannel => {
                self.entries.iter().min_by(|a, b| a.channel.cmp(&b.channel))
            }
        }
    }
}

/// Examine HDU `index`; `None` means it is not catalogued.
fn inspect<S: FitsSource>(
    source: &mut S,
    index: usize,
    options: &ReaderOptions,
    reporter: Reporter<'_>,
) -> Option<ExtensionInfo> {
    let hdu_type = match source.move_to(index) {
        Ok(hdu_type) => hdu_type,
        Err(e) => {
            reporter.report(&format!("Error moving to HDU {index}"), &e);
            return None;
        }
    };
    if hdu_type != HduType::Image {
        log::debug!("HDU {index} is a {hdu_type:?}, skipping");
        return None;
    }

    let name = match source.read_key_string("EXTNAME", options.name_capacity) {
        Ok(name) => name,
        Err(fits_hdu::Error::KeyNotFound(_)) if options.unnamed == UnnamedPolicy::Synthesize => {
            synthesized_name(index)
        }
        Err(fits_hdu::Error::KeyNotFound(_)) => {
            log::warn!("HDU {index} has no EXTNAME, skipping");
            return None;
        }
        Err(e) => {
            reporter.report(&format!("Error reading EXTNAME of HDU {index}"), &e);
            return None;
        }
    };

    let params = match source.image_params(MAX_AXES) {
        Ok(params) => params,
        Err(e) => {
            reporter.report(&format!("Error getting image parameters of HDU {index}"), &e);
            return None;
        }
    };
    if params.naxis != 2 {
        log::warn!(
            "HDU {index} ({name}) has {} axes, only 2-D images are read",
            params.naxis
        );
        return None;
    }

    let mut size = [0; MAX_AXES];
    for (slot, &dim) in size.iter_mut().zip(&params.naxes) {
        *slot = dim;
    }
    log::debug!(
        "HDU {index} ({name}): bitpix {} size {}x{}",
        params.bitpix,
        size[0],
        size[1]
    );

    Some(ExtensionInfo {
        index,
        channel: Channel::new(&name, &options.channel_suffix),
        name,
        bitpix: params.bitpix,
        naxis: params.naxis,
        size,
    })
}

fn synthesized_name(index: usize) -> String {
    if index == 1 {
        String::from("PRIMARY")
    } else {
        format!("HDU{index}")
    }
}
