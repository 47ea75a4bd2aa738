//! Shared fakes for media-service integration tests
#![allow(dead_code)]

use std::collections::{BTreeSet, HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use media_service::db::VideoRepository;
use media_service::metrics::EncodingObserver;
use media_service::storage::{object_key, MediaResourceGateway, RawResource};
use media_service::{AppError, Result};
use uuid::Uuid;
use video_core::{EncodingStatus, MediaKind, Rating, StoredResource, Transition, Video, VideoDetails};

pub fn sample_details() -> VideoDetails {
    VideoDetails {
        title: "Distributed Systems".to_string(),
        description: "Consensus from first principles".to_string(),
        release_year: 2023,
        duration: 95.0,
        opened: true,
        published: false,
        rating: Rating::Age12,
        categories: BTreeSet::from([Uuid::new_v4()]),
        genres: BTreeSet::new(),
        cast_members: BTreeSet::new(),
    }
}

/// Repository backed by a map, with the same version check as Postgres
#[derive(Default)]
pub struct InMemoryVideoRepository {
    videos: Mutex<HashMap<Uuid, Video>>,
    saves: AtomicUsize,
    fail_saves: AtomicBool,
    conflict_next_save: AtomicBool,
    corrupt_reads: AtomicBool,
}

impl InMemoryVideoRepository {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Store a video directly, bypassing the save counter
    pub fn insert(&self, video: Video) -> Video {
        let stored = video.persisted(1);
        self.videos
            .lock()
            .unwrap()
            .insert(stored.id(), stored.clone());
        stored
    }

    pub fn get(&self, video_id: Uuid) -> Option<Video> {
        self.videos.lock().unwrap().get(&video_id).cloned()
    }

    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub fn fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    /// Make the next save lose a race against a concurrent writer
    pub fn conflict_next_save(&self) {
        self.conflict_next_save.store(true, Ordering::SeqCst);
    }

    /// Make reads fail as if the stored row held a value the model rejects
    pub fn corrupt_reads(&self, corrupt: bool) {
        self.corrupt_reads.store(corrupt, Ordering::SeqCst);
    }
}

#[async_trait]
impl VideoRepository for InMemoryVideoRepository {
    async fn find_by_id(&self, video_id: Uuid) -> Result<Option<Video>> {
        if self.corrupt_reads.load(Ordering::SeqCst) {
            return Err(AppError::DataIntegrity(format!(
                "unknown rating code on video {video_id}: XX"
            )));
        }
        Ok(self.get(video_id))
    }

    async fn save(&self, video: Video) -> Result<Video> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(AppError::DatabaseError("connection refused".to_string()));
        }
        if self.conflict_next_save.swap(false, Ordering::SeqCst) {
            return Err(AppError::Conflict(format!("video {} was modified", video.id())));
        }

        let mut videos = self.videos.lock().unwrap();
        let stored_version = videos.get(&video.id()).map_or(0, Video::version);
        if stored_version != video.version() {
            return Err(AppError::Conflict(format!(
                "expected version {}, found {}",
                video.version(),
                stored_version
            )));
        }

        let saved = video.persisted(stored_version + 1);
        videos.insert(saved.id(), saved.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(saved)
    }
}

/// Gateway that keeps objects in a map and hands out predictable descriptors
#[derive(Default)]
pub struct InMemoryGateway {
    next_resource_ids: Mutex<VecDeque<String>>,
    objects: Mutex<HashMap<String, Bytes>>,
    audio_video_stores: AtomicUsize,
    image_stores: AtomicUsize,
}

impl InMemoryGateway {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Resource ids to hand out, in order, before falling back to random ones
    pub fn with_resource_ids(ids: &[&str]) -> Arc<Self> {
        let gateway = Self::default();
        gateway
            .next_resource_ids
            .lock()
            .unwrap()
            .extend(ids.iter().map(|id| id.to_string()));
        Arc::new(gateway)
    }

    pub fn audio_video_stores(&self) -> usize {
        self.audio_video_stores.load(Ordering::SeqCst)
    }

    pub fn image_stores(&self) -> usize {
        self.image_stores.load(Ordering::SeqCst)
    }

    /// Bytes stored under a location, if any
    pub fn object(&self, location: &str) -> Option<Bytes> {
        self.objects.lock().unwrap().get(location).cloned()
    }

    pub fn object_count(&self) -> usize {
        self.objects.lock().unwrap().len()
    }

    fn descriptor(&self, video_id: Uuid, resource: &RawResource) -> StoredResource {
        let resource_id = self
            .next_resource_ids
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let location = object_key(video_id, resource.kind, &resource_id);

        self.objects
            .lock()
            .unwrap()
            .insert(location.clone(), resource.content.clone());

        StoredResource {
            resource_id,
            checksum: resource.checksum(),
            name: resource.name.clone(),
            location,
        }
    }
}

#[async_trait]
impl MediaResourceGateway for InMemoryGateway {
    async fn store_audio_video(
        &self,
        video_id: Uuid,
        resource: RawResource,
    ) -> Result<StoredResource> {
        self.audio_video_stores.fetch_add(1, Ordering::SeqCst);
        Ok(self.descriptor(video_id, &resource))
    }

    async fn store_image(&self, video_id: Uuid, resource: RawResource) -> Result<StoredResource> {
        self.image_stores.fetch_add(1, Ordering::SeqCst);
        Ok(self.descriptor(video_id, &resource))
    }
}

/// Observer that counts what it was told
#[derive(Default)]
pub struct RecordingObserver {
    pub transitions: Mutex<Vec<(Uuid, MediaKind, EncodingStatus, Transition)>>,
    pub not_found: AtomicUsize,
    pub stale: AtomicUsize,
    pub encoder_errors: AtomicUsize,
    pub unrecognized: AtomicUsize,
    pub unprocessable: AtomicUsize,
    pub retries: AtomicUsize,
}

impl RecordingObserver {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn count(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

impl EncodingObserver for RecordingObserver {
    fn transition(
        &self,
        video_id: Uuid,
        kind: MediaKind,
        status: EncodingStatus,
        transition: Transition,
    ) {
        self.transitions
            .lock()
            .unwrap()
            .push((video_id, kind, status, transition));
    }

    fn video_not_found(&self, _video_id: Uuid, _resource_id: &str) {
        self.not_found.fetch_add(1, Ordering::SeqCst);
    }

    fn stale_resource(&self, _video_id: Uuid, _resource_id: &str) {
        self.stale.fetch_add(1, Ordering::SeqCst);
    }

    fn encoder_error(&self, _video_id: Option<Uuid>, _resource_id: Option<&str>, _message: &str) {
        self.encoder_errors.fetch_add(1, Ordering::SeqCst);
    }

    fn unrecognized_event(&self, _reason: &str) {
        self.unrecognized.fetch_add(1, Ordering::SeqCst);
    }

    fn unprocessable_event(&self, _video_id: Uuid, _resource_id: &str, _reason: &str) {
        self.unprocessable.fetch_add(1, Ordering::SeqCst);
    }

    fn retry_scheduled(&self, _attempt: u32, _backoff: Duration) {
        self.retries.fetch_add(1, Ordering::SeqCst);
    }
}

/// Raw resource fixture for a slot
pub fn raw(kind: MediaKind, content: &'static [u8]) -> RawResource {
    RawResource::new(kind, content, "application/octet-stream", format!("{kind}.bin"))
}
