use std::path::Path;
use std::sync::Arc;

use fits_hdu::FitsFile;

use crate::catalog::ExtensionCatalog;
use crate::channel::{Channel, ChannelSet};
use crate::decoder::RowDecoder;
use crate::descriptor::ImageDescriptor;
use crate::error::ReaderError;
use crate::handle::SharedHandle;
use crate::options::ReaderOptions;
use crate::row::Row;
use crate::sink::{ErrorSink, Reporter};
use crate::source::FitsSource;

/// An opened multi-extension FITS file presented as one image with a
/// channel per 2-D image extension.
///
/// Rows may be decoded from several threads at once; reads of the
/// underlying file are serialized internally.
pub struct FitsReader<S: FitsSource = FitsFile> {
    handle: SharedHandle<S>,
    catalog: ExtensionCatalog,
    info: ImageDescriptor,
    sink: Option<Arc<dyn ErrorSink>>,
    label: String,
}

impl FitsReader {
    /// Open `path` and catalogue its image extensions.
    ///
    /// Errors are logged and, if `sink` is given, reported to it before
    /// being returned.
    pub fn open<P: AsRef<Path>>(
        path: P,
        options: &ReaderOptions,
        sink: Option<Arc<dyn ErrorSink>>,
    ) -> Result<Self, ReaderError> {
        let path = path.as_ref();
        log::info!("Reading in FITS file: {}", path.display());

        let file = match FitsFile::open(path) {
            Ok(file) => file,
            Err(source) => {
                Reporter::new(sink.as_deref())
                    .report(&format!("Error reading file {}", path.display()), &source);
                return Err(ReaderError::Open {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        Self::from_source(file, options, sink)
    }
}

impl<S: FitsSource> FitsReader<S> {
    /// Catalogue an already opened source.
    pub fn from_source(
        mut source: S,
        options: &ReaderOptions,
        sink: Option<Arc<dyn ErrorSink>>,
    ) -> Result<Self, ReaderError> {
        let reporter = Reporter::new(sink.as_deref());
        let catalog = ExtensionCatalog::build(&mut source, options, reporter)?;

        let Some(primary) = catalog.primary(options.primary) else {
            let e = ReaderError::NoImageData;
            reporter.report_status(source.label(), &e, e.status_text());
            return Err(e);
        };
        if let Err(e) = source.move_to(primary.index) {
            reporter.report(&format!("Error moving to HDU {}", primary.index), &e);
        }
        let info = ImageDescriptor::new(primary, &catalog);
        log::info!(
            "{}: {}x{} with {} channels",
            source.label(),
            info.width,
            info.height,
            info.depth()
        );

        Ok(FitsReader {
            label: source.label().to_string(),
            handle: SharedHandle::new(source),
            catalog,
            info,
            sink,
        })
    }

    pub fn info(&self) -> &ImageDescriptor {
        &self.info
    }

    pub fn catalog(&self) -> &ExtensionCatalog {
        &self.catalog
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// A decoder sharing this reader's file and sink.
    pub fn decoder(&self) -> RowDecoder<'_, S> {
        RowDecoder::new(
            &self.catalog,
            &self.handle,
            Reporter::new(self.sink.as_deref()),
        )
    }

    /// Decode columns `[x, r)` of row `y` for each of `channels` into `row`.
    pub fn engine(&self, y: usize, x: usize, r: usize, channels: &ChannelSet, row: &mut Row) {
        self.decoder().engine(y, x, r, channels, row);
    }

    /// Decode `out.len()` samples of one channel starting at `(x, y)`.
    pub fn decode_channel(
        &self,
        channel: &Channel,
        y: usize,
        x: usize,
        out: &mut [f32],
    ) -> Result<bool, ReaderError> {
        self.decoder().decode_channel(channel, y, x, out)
    }

    /// Read the whole plane of `channel` at its own size, indexed
    /// `[row, column]`.
    #[cfg(feature = "array")]
    pub fn read_plane(&self, channel: &Channel) -> Result<ndarray::Array2<f32>, ReaderError> {
        let entry = self
            .catalog
            .get(channel)
            .ok_or_else(|| ReaderError::UnknownChannel(channel.clone()))?;
        let mut plane = ndarray::Array2::<f32>::zeros((entry.height(), entry.width()));
        let decoder = self.decoder();
        for (y, mut line) in plane.rows_mut().into_iter().enumerate() {
            if let Some(out) = line.as_slice_mut() {
                decoder.decode_channel(channel, y, 0, out)?;
            }
        }
        Ok(plane)
    }
}

impl<S: FitsSource> Drop for FitsReader<S> {
    fn drop(&mut self) {
        log::info!("Closing FITS file: {}", self.label);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::{DuplicatePolicy, PrimarySelection};
    use crate::sink::CollectingSink;
    use crate::source::mock::{MockHdu, MockSource};

    fn collecting() -> (Arc<CollectingSink>, Option<Arc<dyn ErrorSink>>) {
        let sink = Arc::new(CollectingSink::new());
        let dyn_sink: Arc<dyn ErrorSink> = sink.clone();
        (sink, Some(dyn_sink))
    }

    #[test]
    fn descriptor_from_first_extension() {
        let source = MockSource::new(vec![
            MockHdu::empty_primary(),
            MockHdu::image("SCI", 6, 4, 0.0),
            MockHdu::image("ERR", 6, 4, 0.0),
        ]);
        let reader = FitsReader::from_source(source, &ReaderOptions::default(), None).unwrap();
        assert_eq!((reader.info().width, reader.info().height), (6, 4));
        assert_eq!(reader.info().depth(), 2);
        assert_eq!(reader.label(), "mock");
        assert_eq!(reader.catalog().len(), 2);
    }

    #[test]
    fn cursor_left_on_primary() {
        let source = MockSource::new(vec![
            MockHdu::image("B", 2, 2, 0.0),
            MockHdu::image("A", 3, 3, 0.0),
        ]);
        let options = ReaderOptions::new().with_primary(PrimarySelection::LowestChannel);
        let reader = FitsReader::from_source(source, &options, None).unwrap();
        assert_eq!(reader.info().width, 3);
        assert_eq!(reader.handle.lock().current, 2);
    }

    #[test]
    fn no_image_data_is_fatal() {
        let (sink, dyn_sink) = collecting();
        let source = MockSource::new(vec![MockHdu::empty_primary(), MockHdu::table("CAT")]);
        let result = FitsReader::from_source(source, &ReaderOptions::default(), dyn_sink);
        assert!(matches!(result, Err(ReaderError::NoImageData)));
        assert_eq!(sink.messages(), vec!["mock: no image data found"]);
    }

    #[test]
    fn hdu_count_failure_is_fatal() {
        let (sink, dyn_sink) = collecting();
        let mut source = MockSource::new(vec![MockHdu::image("A", 2, 2, 0.0)]);
        source.fail_count = true;
        let result = FitsReader::from_source(source, &ReaderOptions::default(), dyn_sink);
        assert!(matches!(result, Err(ReaderError::HduCount(_))));
        assert_eq!(
            sink.messages(),
            vec!["Error getting number of HDUs: tried to move past end of file"]
        );
    }

    #[test]
    fn engine_reads_through_shared_handle() {
        let source = MockSource::new(vec![
            MockHdu::image("A", 4, 4, 10.0),
            MockHdu::image("A", 4, 4, 20.0),
        ]);
        let options = ReaderOptions::new().with_duplicates(DuplicatePolicy::Disambiguate);
        let reader = FitsReader::from_source(source, &options, None).unwrap();
        let channels = reader.info().channels.clone();
        let mut row = Row::new(0, 2);
        reader.engine(3, 0, 2, &channels, &mut row);
        assert_eq!(row.get(&Channel::from("A.r")).unwrap(), &[10.0, 11.0]);
        assert_eq!(row.get(&Channel::from("A_2.r")).unwrap(), &[20.0, 21.0]);
    }

    #[test]
    fn missing_file_reports_and_fails() {
        let (sink, dyn_sink) = collecting();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.fits");
        let result = FitsReader::open(&path, &ReaderOptions::default(), dyn_sink);
        assert!(matches!(result, Err(ReaderError::Open { .. })));
        let messages = sink.messages();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].starts_with("Error reading file "));
        assert!(messages[0].ends_with(": could not open the named file"));
    }

    #[cfg(feature = "array")]
    #[test]
    fn read_plane_uses_channel_size() {
        let source = MockSource::new(vec![
            MockHdu::image("A", 3, 2, 1.0),
            MockHdu::image("B", 2, 2, 5.0),
        ]);
        let reader = FitsReader::from_source(source, &ReaderOptions::default(), None).unwrap();
        let plane = reader.read_plane(&Channel::from("B.r")).unwrap();
        assert_eq!(plane.shape(), &[2, 2]);
        assert_eq!(plane[[1, 1]], 6.0);
        assert!(matches!(
            reader.read_plane(&Channel::from("Z.r")),
            Err(ReaderError::UnknownChannel(_))
        ));
    }
}
