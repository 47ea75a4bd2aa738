mod common;

use std::sync::Arc;

use common::{raw, sample_details, InMemoryGateway, InMemoryVideoRepository, RecordingObserver};
use media_service::kafka::{Disposition, EncoderEventHandler};
use media_service::services::{MediaStatusReconciler, MediaUploadService};
use uuid::Uuid;
use video_core::{EncodingStatus, MediaKind, StoredResource, Video};

struct Harness {
    repository: Arc<InMemoryVideoRepository>,
    observer: Arc<RecordingObserver>,
    handler: EncoderEventHandler,
}

fn harness() -> Harness {
    let repository = InMemoryVideoRepository::new();
    let observer = RecordingObserver::new();
    let reconciler = Arc::new(MediaStatusReconciler::new(
        repository.clone(),
        observer.clone(),
    ));
    let handler = EncoderEventHandler::new(reconciler, observer.clone());
    Harness {
        repository,
        observer,
        handler,
    }
}

fn completed_payload(video_id: Uuid, resource_id: &str, folder: &str, file: &str) -> Vec<u8> {
    serde_json::json!({
        "status": "COMPLETED",
        "id": video_id.to_string(),
        "video": {
            "resource_id": resource_id,
            "encoded_video_folder": folder,
            "file_path": file,
        }
    })
    .to_string()
    .into_bytes()
}

fn seed_video_slot(repository: &InMemoryVideoRepository, resource_id: &str) -> Video {
    let mut video = Video::new(sample_details());
    video.attach_media(
        MediaKind::Video,
        StoredResource {
            resource_id: resource_id.to_string(),
            checksum: "sha".to_string(),
            name: "movie.mp4".to_string(),
            location: "raw/movie".to_string(),
        },
    );
    repository.insert(video)
}

#[tokio::test]
async fn completed_event_is_acked_after_write() {
    let h = harness();
    let video = seed_video_slot(&h.repository, "R1");

    let disposition = h
        .handler
        .handle(&completed_payload(video.id(), "R1", "enc", "v1.mp4"))
        .await;

    assert_eq!(disposition, Disposition::Ack);
    assert_eq!(h.repository.save_count(), 1);
}

#[tokio::test]
async fn completed_event_with_failing_store_is_retried() {
    let h = harness();
    let video = seed_video_slot(&h.repository, "R1");
    h.repository.fail_saves(true);

    let disposition = h
        .handler
        .handle(&completed_payload(video.id(), "R1", "enc", "v1.mp4"))
        .await;

    assert_eq!(disposition, Disposition::Retry);
    assert_eq!(
        h.repository.get(video.id()).unwrap().video().unwrap().status,
        EncodingStatus::Pending
    );
}

#[tokio::test]
async fn version_conflict_is_retried() {
    let h = harness();
    let video = seed_video_slot(&h.repository, "R1");
    h.repository.conflict_next_save();
    let payload = completed_payload(video.id(), "R1", "enc", "v1.mp4");

    assert_eq!(h.handler.handle(&payload).await, Disposition::Retry);
    // the redelivered message goes through
    assert_eq!(h.handler.handle(&payload).await, Disposition::Ack);
    assert_eq!(h.repository.save_count(), 1);
}

#[tokio::test]
async fn undecodable_stored_video_is_acked_not_retried() {
    let h = harness();
    let video = seed_video_slot(&h.repository, "R1");
    h.repository.corrupt_reads(true);
    let payload = completed_payload(video.id(), "R1", "enc", "v1.mp4");

    // redelivery cannot fix a corrupt row, so the partition must move on
    assert_eq!(h.handler.handle(&payload).await, Disposition::Ack);
    assert_eq!(h.handler.handle(&payload).await, Disposition::Ack);
    assert_eq!(RecordingObserver::count(&h.observer.unprocessable), 2);
    assert_eq!(h.repository.save_count(), 0);
}

#[tokio::test]
async fn encoder_error_is_acked_without_write() {
    let h = harness();
    let video = seed_video_slot(&h.repository, "R1");
    let payload = serde_json::json!({
        "status": "ERROR",
        "id": video.id().to_string(),
        "resource_id": "R1",
        "message": "unsupported codec",
    })
    .to_string();

    let disposition = h.handler.handle(payload.as_bytes()).await;

    assert_eq!(disposition, Disposition::Ack);
    assert_eq!(h.repository.save_count(), 0);
    assert_eq!(RecordingObserver::count(&h.observer.encoder_errors), 1);
    assert_eq!(
        h.repository.get(video.id()).unwrap().video().unwrap().status,
        EncodingStatus::Pending
    );
}

#[tokio::test]
async fn garbage_is_acked() {
    let h = harness();

    assert_eq!(h.handler.handle(b"{not json").await, Disposition::Ack);
    assert_eq!(
        h.handler.handle(br#"{"status":"QUEUED"}"#).await,
        Disposition::Ack
    );
    assert_eq!(h.handler.handle(b"").await, Disposition::Ack);
    assert_eq!(RecordingObserver::count(&h.observer.unrecognized), 3);
    assert_eq!(h.repository.save_count(), 0);
}

#[tokio::test]
async fn event_for_unknown_video_is_acked() {
    let h = harness();

    let disposition = h
        .handler
        .handle(&completed_payload(Uuid::new_v4(), "R1", "enc", "v1.mp4"))
        .await;

    assert_eq!(disposition, Disposition::Ack);
    assert_eq!(RecordingObserver::count(&h.observer.not_found), 1);
}

#[tokio::test]
async fn upload_then_encoder_completion_end_to_end() {
    let repository = InMemoryVideoRepository::new();
    let gateway = InMemoryGateway::with_resource_ids(&["R1"]);
    let observer = RecordingObserver::new();
    let uploads = MediaUploadService::new(repository.clone(), gateway.clone());
    let reconciler = Arc::new(MediaStatusReconciler::new(
        repository.clone(),
        observer.clone(),
    ));
    let handler = EncoderEventHandler::new(reconciler, observer.clone());

    let v1 = repository.insert(Video::new(sample_details()));
    let uploaded = uploads
        .upload(v1.id(), raw(MediaKind::Video, b"raw movie"))
        .await
        .unwrap();
    let media = uploaded.video().unwrap();
    assert_eq!(media.resource_id, "R1");
    assert_eq!(media.status, EncodingStatus::Pending);
    let writes_after_upload = repository.save_count();

    let payload = completed_payload(v1.id(), "R1", "enc", "v1.mp4");
    assert_eq!(handler.handle(&payload).await, Disposition::Ack);

    let encoded = repository.get(v1.id()).unwrap();
    let media = encoded.video().unwrap();
    assert_eq!(media.status, EncodingStatus::Completed);
    assert_eq!(media.encoded_location.as_deref(), Some("enc/v1.mp4"));
    assert_eq!(repository.save_count(), writes_after_upload + 1);

    // redelivery of the same event changes nothing and skips the write
    assert_eq!(handler.handle(&payload).await, Disposition::Ack);
    assert_eq!(repository.get(v1.id()).unwrap(), encoded);
    assert_eq!(repository.save_count(), writes_after_upload + 1);
}
