// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use serde::Deserialize;
use serde_json::Value;
use std::future::Future;
use tracing::{debug, warn};

use crate::client::PortalClient;
use crate::error::{ClientError, Result};
use crate::model::{Channel, Genre, VodItem, data_items, parse_items};
use crate::transport::Transport;
use crate::url_builder::Resource;

/// Index of the first page of an ordered listing.
pub const FIRST_PAGE: u32 = 1;

/// Page size portals are assumed to use. A shorter page is taken to be the
/// last one; this is a compatibility assumption, the protocol carries no
/// reliable total.
pub const FULL_PAGE_SIZE: usize = 14;

/// A record type served by `get_ordered_list`.
pub trait Listing: for<'de> Deserialize<'de> + Clone + Send {
    const RESOURCE: Resource;

    /// Query parameters for one page, `filter` already normalized.
    fn list_params(page: u32, filter: Option<&str>) -> Vec<(&'static str, String)>;
}

impl Listing for Channel {
    const RESOURCE: Resource = Resource::Itv;

    fn list_params(page: u32, filter: Option<&str>) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("p", page.to_string()),
            ("sortby", "number".to_string()),
            ("fav", "0".to_string()),
            ("hd", "0".to_string()),
        ];
        if let Some(genre) = filter {
            params.push(("genre", genre.to_string()));
        }
        params
    }
}

impl Listing for VodItem {
    const RESOURCE: Resource = Resource::Vod;

    fn list_params(page: u32, filter: Option<&str>) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("p", page.to_string()),
            ("sortby", "added".to_string()),
            ("fav", "0".to_string()),
            ("not_ended", "0".to_string()),
        ];
        if let Some(category) = filter {
            params.push(("category", category.to_string()));
        }
        params
    }
}

/// `"*"` is the portal's "all" pseudo id and means no filter.
fn normalize_filter(filter: Option<&str>) -> Option<&str> {
    filter.map(str::trim).filter(|f| !f.is_empty() && *f != "*")
}

/// Accumulates pages from `FIRST_PAGE` until an empty or short page, or
/// until `max_pages` pages have been fetched.
pub async fn collect_pages<L, F, Fut>(max_pages: Option<u32>, mut fetch_page: F) -> Result<Vec<L>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<Vec<L>>>,
{
    let mut all = Vec::new();
    let mut page = FIRST_PAGE;
    let mut fetched = 0;

    loop {
        if max_pages.is_some_and(|max| fetched >= max) {
            debug!("Stopping at page ceiling of {} pages", fetched);
            break;
        }

        let items = fetch_page(page).await?;
        fetched += 1;

        let count = items.len();
        all.extend(items);

        if count < FULL_PAGE_SIZE {
            break;
        }
        page += 1;
    }

    Ok(all)
}

fn parse_genres(js: &Value) -> Result<Vec<Genre>> {
    match js {
        Value::Null => Ok(Vec::new()),
        Value::Array(arr) => {
            let items: Vec<&Value> = arr.iter().filter(|v| v.is_object()).collect();
            Ok(parse_items(&items))
        }
        _ => Err(ClientError::Protocol("expected a list of genres".into())),
    }
}

impl<T: Transport> PortalClient<T> {
    /// One page of an ordered listing.
    pub async fn list_page<L: Listing>(&self, page: u32, filter: Option<&str>) -> Result<Vec<L>> {
        let params = L::list_params(page, normalize_filter(filter));
        let js = self.call(L::RESOURCE, "get_ordered_list", &params).await?;

        let items = data_items(&js);
        if js.get("data").is_none() {
            debug!("No 'data' field in {} response", L::RESOURCE);
        }

        let records: Vec<L> = parse_items(&items);
        debug!("Parsed {} {} items from page {}", records.len(), L::RESOURCE, page);
        Ok(records)
    }

    pub async fn channels_page(&self, genre: Option<&str>, page: u32) -> Result<Vec<Channel>> {
        self.list_page::<Channel>(page, genre).await
    }

    pub async fn vod_page(&self, category: Option<&str>, page: u32) -> Result<Vec<VodItem>> {
        self.list_page::<VodItem>(page, category).await
    }

    /// Every channel across all pages, served from cache while fresh.
    /// `force_refresh` skips the cache and repopulates it.
    pub async fn all_channels(&self, force_refresh: bool) -> Result<Vec<Channel>> {
        if !force_refresh {
            if let Some(channels) = self.cache.channels.get() {
                debug!("Returning {} cached channels", channels.len());
                return Ok(channels);
            }
        }

        debug!("Fetching channels from portal...");
        let channels = collect_pages(None, |page| self.list_page::<Channel>(page, None)).await?;

        self.cache.channels.put(channels.clone());
        debug!("Cached {} channels", channels.len());
        Ok(channels)
    }

    /// VOD items across pages, optionally capped at `max_pages`. Not cached.
    pub async fn all_vod_items(
        &self,
        category: Option<&str>,
        max_pages: Option<u32>,
    ) -> Result<Vec<VodItem>> {
        collect_pages(max_pages, |page| self.list_page::<VodItem>(page, category)).await
    }

    pub async fn genres(&self) -> Result<Vec<Genre>> {
        if let Some(genres) = self.cache.genres.get() {
            debug!("Returning cached genres");
            return Ok(genres);
        }

        let js = self.call(Resource::Itv, "get_genres", &[]).await?;
        let genres = parse_genres(&js)?;

        self.cache.genres.put(genres.clone());
        Ok(genres)
    }

    pub async fn vod_categories(&self) -> Result<Vec<Genre>> {
        let js = self.call(Resource::Vod, "get_categories", &[]).await?;
        parse_genres(&js)
    }
}

/// Degrades a listing failure to an empty list, for callers that only need
/// something to show.
pub trait ListResultExt<T> {
    fn or_empty(self) -> Vec<T>;
}

impl<T> ListResultExt<T> for Result<Vec<T>> {
    fn or_empty(self) -> Vec<T> {
        self.unwrap_or_else(|e| {
            warn!("Listing failed, showing nothing: {}", e);
            Vec::new()
        })
    }
}
