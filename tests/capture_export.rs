use std::sync::{Arc, Mutex};

use glitchlab::{
    CaptureList, CapturedFrame, FrameEncoder, GIF_FRAME_DELAY_MS, GifBackend, GlitchError,
    GlitchResult, Raster, export, export_in_background,
};

/// Records what the export layer hands to a backend.
#[derive(Default)]
struct RecordingBackend {
    calls: usize,
    indices: Vec<u64>,
    delay_ms: Option<u32>,
}

impl FrameEncoder for RecordingBackend {
    fn name(&self) -> &'static str {
        "recording"
    }

    fn encode(&mut self, stills: &[CapturedFrame], frame_delay_ms: u32) -> GlitchResult<Vec<u8>> {
        self.calls += 1;
        self.indices = stills.iter().map(|s| s.index).collect();
        self.delay_ms = Some(frame_delay_ms);
        Ok(vec![0xAB])
    }
}

struct FailingBackend;

impl FrameEncoder for FailingBackend {
    fn name(&self) -> &'static str {
        "failing"
    }

    fn encode(&mut self, _stills: &[CapturedFrame], _delay: u32) -> GlitchResult<Vec<u8>> {
        Err(GlitchError::encode("backend rejected input"))
    }
}

#[test]
fn capture_list_grows_one_per_call_with_ordered_indices() {
    let list = CaptureList::new();
    let r = Raster::solid(4, 4, [50, 60, 70, 255]);
    for n in 1..=5usize {
        list.capture(&r).unwrap();
        assert_eq!(list.len(), n);
    }
    let indices: Vec<u64> = list.snapshot().iter().map(|f| f.index).collect();
    assert_eq!(indices, vec![0, 1, 2, 3, 4]);
}

#[test]
fn concurrent_captures_get_distinct_increasing_indices() {
    let list = Arc::new(CaptureList::new());
    let seen = Arc::new(Mutex::new(Vec::<u64>::new()));
    let r = Raster::solid(4, 4, [1, 2, 3, 255]);

    std::thread::scope(|scope| {
        for _ in 0..4 {
            let list = Arc::clone(&list);
            let seen = Arc::clone(&seen);
            let r = r.clone();
            scope.spawn(move || {
                for _ in 0..10 {
                    let frame = list.capture(&r).unwrap();
                    seen.lock().unwrap().push(frame.index);
                }
            });
        }
    });

    assert_eq!(list.len(), 40);
    let mut seen = seen.lock().unwrap().clone();
    seen.sort_unstable();
    assert_eq!(seen, (0..40).collect::<Vec<u64>>());

    // Snapshot order is append order.
    let snapshot: Vec<u64> = list.snapshot().iter().map(|f| f.index).collect();
    assert_eq!(snapshot, (0..40).collect::<Vec<u64>>());
}

#[test]
fn exporting_an_empty_list_never_invokes_the_backend() {
    let mut backend = RecordingBackend::default();
    let out = export(&mut backend, &CaptureList::new(), GIF_FRAME_DELAY_MS).unwrap();
    assert!(out.is_none());
    assert_eq!(backend.calls, 0);
}

#[test]
fn export_passes_stills_in_capture_order_with_default_delay() {
    let list = CaptureList::new();
    for v in [10u8, 120, 240] {
        list.capture(&Raster::solid(8, 8, [v, v, v, 255])).unwrap();
    }

    let mut backend = RecordingBackend::default();
    let out = export(&mut backend, &list, GIF_FRAME_DELAY_MS).unwrap();
    assert_eq!(out, Some(vec![0xAB]));
    assert_eq!(backend.calls, 1);
    assert_eq!(backend.indices, vec![0, 1, 2]);
    assert_eq!(backend.delay_ms, Some(100));
}

#[test]
fn backend_failure_surfaces_and_leaves_the_list_intact() {
    let list = CaptureList::new();
    list.capture(&Raster::solid(8, 8, [5, 5, 5, 255])).unwrap();

    let err = export(&mut FailingBackend, &list, 100).unwrap_err();
    assert!(err.is_export_failure());
    assert_eq!(list.len(), 1);

    // Retry is a caller decision and safe.
    let mut backend = RecordingBackend::default();
    assert!(export(&mut backend, &list, 100).unwrap().is_some());
}

#[test]
fn background_export_runs_off_thread_and_joins() {
    let list = CaptureList::new();
    list.capture(&Raster::solid(8, 8, [200, 30, 30, 255])).unwrap();
    list.capture(&Raster::solid(8, 8, [30, 200, 30, 255])).unwrap();

    let handle = export_in_background(Box::new(GifBackend::new()), &list, GIF_FRAME_DELAY_MS);

    // The render/capture side keeps going while the export runs.
    list.capture(&Raster::solid(8, 8, [30, 30, 200, 255])).unwrap();

    let bytes = handle.join().unwrap().unwrap().unwrap();
    assert!(bytes.starts_with(b"GIF8"));
    // The export saw its frozen two-frame snapshot, not the later capture.
    assert_eq!(list.len(), 3);
}

#[test]
fn background_export_of_empty_list_is_a_noop() {
    let list = CaptureList::new();
    let handle = export_in_background(Box::new(GifBackend::new()), &list, GIF_FRAME_DELAY_MS);
    assert!(handle.join().unwrap().unwrap().is_none());
}

#[test]
fn gif_round_trip_preserves_frame_count_and_order() {
    let list = CaptureList::new();
    // Three saturated colors survive JPEG and GIF palettes recognizably.
    list.capture(&Raster::solid(16, 16, [255, 0, 0, 255])).unwrap();
    list.capture(&Raster::solid(16, 16, [0, 255, 0, 255])).unwrap();
    list.capture(&Raster::solid(16, 16, [0, 0, 255, 255])).unwrap();

    let bytes = export(&mut GifBackend::new(), &list, GIF_FRAME_DELAY_MS)
        .unwrap()
        .unwrap();

    let decoder = image::codecs::gif::GifDecoder::new(std::io::Cursor::new(bytes)).unwrap();
    let frames = image::AnimationDecoder::into_frames(decoder)
        .collect_frames()
        .unwrap();
    assert_eq!(frames.len(), 3);

    let dominant = |f: &image::Frame| -> usize {
        let px = f.buffer().get_pixel(8, 8);
        (0..3).max_by_key(|&c| px[c]).unwrap()
    };
    assert_eq!(dominant(&frames[0]), 0);
    assert_eq!(dominant(&frames[1]), 1);
    assert_eq!(dominant(&frames[2]), 2);

    let (num, den) = frames[0].delay().numer_denom_ms();
    assert_eq!(num / den, 100);
}
