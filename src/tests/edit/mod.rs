use crate::{
    fetch::{Object, Origin},
    job::{EditError, EditState, EditWorkflow, Mode},
    record::ProductRecord,
    sheet::Cell,
    tests::{FakeImage, FakeText, Harness, cell_text, png_bytes, product_sheet},
};

fn source(bytes: Vec<u8>) -> Object {
    Object {
        body: bytes.into_boxed_slice(),
        content_type: Some("image/png".into()),
        origin: Origin::DataUrl,
    }
}

#[tokio::test]
async fn refined_prompt_is_sent_with_photo() {
    let harness = Harness::new(
        Mode::Edit,
        FakeText::replying("  A sunlit dining room with the cabinet against the wall.  \n"),
        FakeImage::default(),
    );
    let mut sheet = product_sheet([(
        cell_text("OWP0730"),
        harness.photo("OWP0730", &png_bytes(40, 30)),
        Cell::Empty,
    )]);
    harness.executor.run(&mut sheet).await.unwrap();

    let requests = harness.executor.text.requests.lock().unwrap().clone();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].contains("- Model: CAB-1200"));
    assert!(requests[0].contains("- Retail Price: $1299.99"));
    assert!(requests[0].contains("it appears to be a wine cabinet"));

    let calls = harness.executor.image.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(
        calls[0].prompt,
        "A sunlit dining room with the cabinet against the wall."
    );
    assert_eq!(calls[0].reference, Some(("image/png".into(), (40, 30))));
}

#[tokio::test]
async fn failed_refinement_falls_back_to_placement_prompt() {
    let harness = Harness::new(
        Mode::Edit,
        FakeText::failing("model overloaded"),
        FakeImage::default(),
    );
    let mut sheet = product_sheet([(
        cell_text("OWP0730"),
        harness.photo("OWP0730", &png_bytes(8, 8)),
        Cell::Empty,
    )]);
    let summary = harness.executor.run(&mut sheet).await.unwrap();
    assert_eq!(summary.processed, 1);

    let calls = harness.executor.image.calls();
    assert!(calls[0].prompt.starts_with("Analyze the attached photo"));
    assert!(calls[0].prompt.ends_with("Do not include any people in the scene."));
}

#[tokio::test]
async fn target_dimensions_letterbox_the_photo() {
    let harness = Harness::with_options(
        Mode::Edit,
        FakeText::replying("scene"),
        FakeImage::default(),
        |options| options.target = Some((64, 32)),
    );
    let mut sheet = product_sheet([(
        cell_text("OWP0730"),
        harness.photo("OWP0730", &png_bytes(10, 10)),
        Cell::Empty,
    )]);
    harness.executor.run(&mut sheet).await.unwrap();

    let calls = harness.executor.image.calls();
    assert_eq!(calls[0].reference, Some(("image/png".into(), (64, 32))));
}

#[tokio::test]
async fn image_failure_ends_workflow() {
    let text = FakeText::replying("scene");
    let image = FakeImage::failing_on(&[1]);
    let workflow = EditWorkflow {
        text: &text,
        image: &image,
        target: None,
    };
    let product = ProductRecord::default();
    let photo = source(png_bytes(4, 4));
    let state = EditState::new("place it".into(), &product, &photo);

    let error = workflow.run(state).await.unwrap_err();
    assert!(matches!(error, EditError::Edit(_)));
    assert_eq!(image.calls()[0].prompt, "scene");
}

#[tokio::test]
async fn undecodable_photo_stops_before_editing() {
    let text = FakeText::replying("scene");
    let image = FakeImage::default();
    let workflow = EditWorkflow {
        text: &text,
        image: &image,
        target: Some((32, 32)),
    };
    let product = ProductRecord::default();
    let photo = source(b"<html>not found</html>".to_vec());
    let state = EditState::new("place it".into(), &product, &photo);

    let error = workflow.run(state).await.unwrap_err();
    assert!(matches!(error, EditError::Decode(_)));
    assert!(image.calls().is_empty());
}
