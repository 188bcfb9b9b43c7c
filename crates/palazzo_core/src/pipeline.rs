//! crates/palazzo_core/src/pipeline.rs
//!
//! The furniture extraction pipeline: one structured listing call, then a
//! concurrent fan-out of product photo requests joined back by position.

use crate::domain::{FurnitureItem, ImageData, PartialItem};
use crate::ports::{ItemExtractionService, PortError, PortResult, ProductPhotoService};
use chrono::Utc;
use futures::future::join_all;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

#[derive(Clone)]
pub struct FurniturePipeline {
    extractor: Arc<dyn ItemExtractionService>,
    photos: Arc<dyn ProductPhotoService>,
}

impl FurniturePipeline {
    pub fn new(
        extractor: Arc<dyn ItemExtractionService>,
        photos: Arc<dyn ProductPhotoService>,
    ) -> Self {
        Self { extractor, photos }
    }

    /// Runs both steps. Only a failure of the listing call aborts the batch.
    pub async fn extract_full_list(&self, image: &ImageData) -> PortResult<Vec<FurnitureItem>> {
        self.extract_full_list_with(image, |_| Ok::<(), PortError>(()))
            .await
    }

    /// Same as `extract_full_list`, with `on_listed` called between the two
    /// steps with the number of items found. An error from `on_listed` stops
    /// the batch before any photo is requested.
    pub async fn extract_full_list_with<E: From<PortError>>(
        &self,
        image: &ImageData,
        on_listed: impl FnOnce(usize) -> Result<(), E>,
    ) -> Result<Vec<FurnitureItem>, E> {
        let partials = self.identify(image).await?;
        on_listed(partials.len())?;
        Ok(self.attach_photos(partials).await)
    }

    /// Step one: the structured item list, in service order.
    async fn identify(&self, image: &ImageData) -> PortResult<Vec<PartialItem>> {
        let start = Instant::now();
        let partials = self.extractor.extract_items(image).await?;
        info!(
            "Identified {} items in {:?}.",
            partials.len(),
            start.elapsed()
        );
        Ok(partials)
    }

    /// Step two: one photo request per item, all in flight together.
    ///
    /// `join_all` yields results in input order, so item `i` always receives
    /// photo `i` no matter which request settles first.
    async fn attach_photos(&self, partials: Vec<PartialItem>) -> Vec<FurnitureItem> {
        let start = Instant::now();
        let photos = join_all(
            partials
                .iter()
                .map(|item| self.photos.synthesize_item_image(&item.name)),
        )
        .await;

        let batch = Utc::now().timestamp_millis();
        let items: Vec<FurnitureItem> = partials
            .into_iter()
            .zip(photos)
            .enumerate()
            .map(|(index, (partial, photo))| {
                if photo.is_none() {
                    warn!("No product photo for '{}'.", partial.name);
                }
                FurnitureItem::from_partial(format!("{batch}-{index}"), partial, photo)
            })
            .collect();

        info!(
            "Product photos for {} items took {:?}.",
            items.len(),
            start.elapsed()
        );
        items
    }
}
