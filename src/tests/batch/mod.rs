use std::time::Duration;

use crate::{
    job::{Mode, Summary},
    record::column,
    sheet::{self, Cell, Sheet},
    tests::{
        BASE_URL, FakeImage, FakeText, Harness, LIFESTYLE, cell_text, is_png_file, jpeg_bytes,
        png_bytes, product_sheet,
    },
};

fn lifestyle(sheet: &Sheet, row: usize) -> Option<String> {
    sheet.cell(row, LIFESTYLE).and_then(Cell::text)
}

#[tokio::test]
async fn complete_missing_and_done_rows() {
    let harness = Harness::new(Mode::Edit, FakeText::replying("a staged room"), FakeImage::default());
    let mut sheet = product_sheet([
        (cell_text("OWP0730"), harness.photo("OWP0730", &png_bytes(40, 30)), Cell::Empty),
        (cell_text("OWP0731"), Cell::Empty, Cell::Empty),
        (
            cell_text("OWP0732"),
            harness.photo("OWP0732", &png_bytes(40, 30)),
            cell_text("https://cdn.example.com/rooms/existing.png"),
        ),
    ]);

    let summary = harness.executor.run(&mut sheet).await.unwrap();
    assert_eq!(
        summary,
        Summary {
            processed: 1,
            skipped: 1,
            already_done: 1,
            errors: 0
        }
    );
    assert_eq!(sheet.len(), 3);
    assert_eq!(
        lifestyle(&sheet, 0).as_deref(),
        Some("https://cdn.example.com/rooms/OWP0730_room.png")
    );
    assert_eq!(lifestyle(&sheet, 1), None);
    assert_eq!(
        lifestyle(&sheet, 2).as_deref(),
        Some("https://cdn.example.com/rooms/existing.png")
    );
    assert!(is_png_file(&harness.output_dir().join("OWP0730_room.png")));
    assert!(is_png_file(&harness.public_dir().join("OWP0730_room.png")));
    assert_eq!(harness.executor.image.calls().len(), 1);

    // untouched columns keep their values
    let comment = sheet.column(column::COMMENT).unwrap();
    for row in 0..3 {
        assert_eq!(sheet.cell(row, comment), Some(&cell_text("keep me")));
    }
}

#[tokio::test]
async fn failed_generation_marks_row_and_continues() {
    let harness = Harness::new(Mode::Edit, FakeText::replying("scene"), FakeImage::failing_on(&[1]));
    let mut sheet = product_sheet([
        (cell_text("OWP0001"), harness.photo("OWP0001", &png_bytes(8, 8)), Cell::Empty),
        (cell_text("OWP0002"), harness.photo("OWP0002", &png_bytes(8, 8)), Cell::Empty),
    ]);

    let summary = harness.executor.run(&mut sheet).await.unwrap();
    assert_eq!((summary.processed, summary.errors), (1, 1));
    assert_eq!(
        lifestyle(&sheet, 0).as_deref(),
        Some("ERROR: image editing failed: quota exceeded")
    );
    assert_eq!(
        lifestyle(&sheet, 1),
        Some(format!("{BASE_URL}OWP0002_room.png"))
    );
    assert!(!harness.output_dir().join("OWP0001_room.png").exists());
}

#[tokio::test]
async fn rerun_is_idempotent_unless_retrying_errors() {
    let harness = Harness::new(Mode::Imagen, FakeText::replying(""), FakeImage::failing_on(&[1]));
    let mut sheet = product_sheet([
        (cell_text("OWP0001"), harness.photo("OWP0001", &png_bytes(8, 8)), Cell::Empty),
        (cell_text("OWP0002"), harness.photo("OWP0002", &png_bytes(8, 8)), Cell::Empty),
    ]);
    let first = harness.executor.run(&mut sheet).await.unwrap();
    assert_eq!((first.processed, first.errors), (1, 1));
    let after_first = sheet.clone();

    let second = harness.executor.run(&mut sheet).await.unwrap();
    assert_eq!(second.already_done, 2);
    assert_eq!(sheet, after_first);
    assert_eq!(harness.executor.image.calls().len(), 2);

    let mut retrying = Harness::new(Mode::Imagen, FakeText::replying(""), FakeImage::default());
    retrying.executor.options.retry_errors = true;
    let mut sheet = product_sheet([
        (
            cell_text("OWP0001"),
            retrying.photo("OWP0001", &png_bytes(8, 8)),
            lifestyle(&after_first, 0).map(Cell::Text).unwrap(),
        ),
        (
            cell_text("OWP0002"),
            retrying.photo("OWP0002", &png_bytes(8, 8)),
            lifestyle(&after_first, 1).map(Cell::Text).unwrap(),
        ),
    ]);
    let third = retrying.executor.run(&mut sheet).await.unwrap();
    assert_eq!((third.processed, third.already_done), (1, 1));
    assert_eq!(
        lifestyle(&sheet, 0),
        Some(format!("{BASE_URL}OWP0001_room.png"))
    );
}

#[tokio::test]
async fn unreadable_source_photo_is_a_record_error() {
    let harness = Harness::new(Mode::Edit, FakeText::replying("scene"), FakeImage::default());
    let mut sheet = product_sheet([
        (cell_text("OWP0001"), harness.missing_photo(), Cell::Empty),
        (Cell::Empty, harness.photo("none", &png_bytes(8, 8)), Cell::Empty),
    ]);

    let summary = harness.executor.run(&mut sheet).await.unwrap();
    assert_eq!((summary.errors, summary.skipped), (1, 1));
    let marker = lifestyle(&sheet, 0).unwrap();
    assert!(marker.starts_with("ERROR: failed to read local file"), "{marker}");
    assert_eq!(lifestyle(&sheet, 1), None);
    assert!(harness.executor.image.calls().is_empty());
}

#[tokio::test]
async fn missing_output_column_is_fatal() {
    let harness = Harness::new(Mode::Edit, FakeText::replying("scene"), FakeImage::default());
    let mut sheet = Sheet::new("Products", [column::WL, column::SILO_IMAGE]);
    sheet.push_row([cell_text("OWP0001"), harness.photo("OWP0001", &png_bytes(8, 8))]);

    let error = harness.executor.run(&mut sheet).await.unwrap_err();
    assert!(matches!(error, sheet::Error::MissingColumn(name) if name == column::LIFESTYLE_IMAGE));
    assert!(harness.executor.image.calls().is_empty());
}

#[tokio::test]
async fn imagen_mode_generates_from_scene_prompt() {
    let image = FakeImage {
        output: jpeg_bytes(16, 9),
        ..Default::default()
    };
    let harness = Harness::new(Mode::Imagen, FakeText::failing("unused"), image);
    let mut sheet = product_sheet([(
        cell_text("OWP0730"),
        harness.photo("OWP0730", &png_bytes(8, 8)),
        Cell::Empty,
    )]);

    let summary = harness.executor.run(&mut sheet).await.unwrap();
    assert_eq!(summary.processed, 1);
    let calls = harness.executor.image.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].reference, None);
    assert!(calls[0].prompt.starts_with(
        "Create a photorealistic, high-end interior design photograph featuring a medium wood wood wine cabinet"
    ));
    assert!(harness.executor.text.requests.lock().unwrap().is_empty());
    // jpeg output is stored as png
    assert!(is_png_file(&harness.output_dir().join("OWP0730_room.png")));
}

#[tokio::test]
async fn sheet_survives_write_and_reload() {
    let harness = Harness::new(Mode::Edit, FakeText::replying("scene"), FakeImage::default());
    let mut products = product_sheet([
        (cell_text("OWP0730"), harness.photo("OWP0730", &png_bytes(8, 8)), Cell::Empty),
        (cell_text("OWP0731"), Cell::Empty, Cell::Empty),
    ]);
    harness.executor.run(&mut products).await.unwrap();

    let path = harness.dir.path().join("out").join("updated.xlsx");
    sheet::save(&products, &path).unwrap();
    let reloaded = sheet::load(&path).unwrap();
    assert_eq!(reloaded.len(), 2);
    assert_eq!(reloaded.headers(), products.headers());
    assert_eq!(
        lifestyle(&reloaded, 0),
        Some(format!("{BASE_URL}OWP0730_room.png"))
    );
    assert_eq!(lifestyle(&reloaded, 1), None);
}

#[tokio::test(start_paused = true)]
async fn delay_follows_attempted_records_except_the_last() {
    let harness = Harness::with_options(
        Mode::Edit,
        FakeText::replying("scene"),
        FakeImage::default(),
        |options| options.item_delay = Duration::from_secs(10),
    );
    let mut sheet = product_sheet([
        (cell_text("OWP0001"), harness.photo("OWP0001", &png_bytes(8, 8)), Cell::Empty),
        (cell_text("OWP0002"), Cell::Empty, Cell::Empty),
        (
            cell_text("OWP0003"),
            harness.photo("OWP0003", &png_bytes(8, 8)),
            cell_text("https://cdn.example.com/rooms/OWP0003_room.png"),
        ),
        (cell_text("OWP0004"), harness.missing_photo(), Cell::Empty),
        (cell_text("OWP0005"), harness.photo("OWP0005", &png_bytes(8, 8)), Cell::Empty),
    ]);

    let started = tokio::time::Instant::now();
    let summary = harness.executor.run(&mut sheet).await.unwrap();
    let elapsed = started.elapsed();
    assert_eq!(
        (summary.processed, summary.skipped, summary.already_done, summary.errors),
        (2, 1, 1, 1)
    );
    // one wait after OWP0001 and one after the failed OWP0004
    assert!(elapsed >= Duration::from_secs(20), "{elapsed:?}");
    assert!(elapsed < Duration::from_secs(30), "{elapsed:?}");
}

#[tokio::test(start_paused = true)]
async fn single_record_batch_does_not_wait() {
    let harness = Harness::with_options(
        Mode::Edit,
        FakeText::replying("scene"),
        FakeImage::default(),
        |options| options.item_delay = Duration::from_secs(10),
    );
    let mut sheet = product_sheet([(
        cell_text("OWP0001"),
        harness.photo("OWP0001", &png_bytes(8, 8)),
        Cell::Empty,
    )]);

    let started = tokio::time::Instant::now();
    harness.executor.run(&mut sheet).await.unwrap();
    assert!(started.elapsed() < Duration::from_secs(10));
}

#[tokio::test]
async fn blank_separator_rows_keep_their_position() {
    let harness = Harness::new(Mode::Edit, FakeText::replying("scene"), FakeImage::default());
    let mut products = product_sheet([(
        cell_text("OWP0730"),
        harness.photo("OWP0730", &png_bytes(8, 8)),
        Cell::Empty,
    )]);
    products.push_row(Vec::<Cell>::new());
    products.push_row([
        cell_text("CAB-1300"),
        cell_text("OWP0731"),
        Cell::Float(899.0),
        harness.photo("OWP0731", &png_bytes(8, 8)),
        Cell::Empty,
        Cell::Empty,
    ]);
    let path = harness.dir.path().join("separated.xlsx");
    sheet::save(&products, &path).unwrap();

    let mut reloaded = sheet::load(&path).unwrap();
    assert_eq!(reloaded.len(), 3);
    let summary = harness.executor.run(&mut reloaded).await.unwrap();
    assert_eq!((summary.processed, summary.skipped), (2, 1));
    assert_eq!(lifestyle(&reloaded, 0), Some(format!("{BASE_URL}OWP0730_room.png")));
    assert_eq!(lifestyle(&reloaded, 1), None);
    assert_eq!(lifestyle(&reloaded, 2), Some(format!("{BASE_URL}OWP0731_room.png")));
}
