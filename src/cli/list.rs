// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: (C) 2025 Cranky Kernel <crankykernel@proton.me>

use anyhow::Result;
use serde::Serialize;

use super::{CommandContext, OutputFormat, spinner};
use stb_portal::{Channel, Genre, PortalClient, Transport, VodItem};

pub enum ListCommand {
    Genres,
    Channels {
        genre: Option<String>,
        page: Option<u32>,
        refresh: bool,
    },
    VodCategories,
    Vod {
        category: Option<String>,
        page: Option<u32>,
        max_pages: Option<u32>,
    },
}

impl ListCommand {
    pub async fn execute(self, context: CommandContext, format: OutputFormat) -> Result<()> {
        let client = context.connect().await?;
        self.run_then_logout(&client, &context, format).await
    }

    /// The session is closed whether or not the listing succeeded.
    async fn run_then_logout<T: Transport>(
        self,
        client: &PortalClient<T>,
        context: &CommandContext,
        format: OutputFormat,
    ) -> Result<()> {
        let result = self.run(client, context, format).await;
        client.logout().await;
        result
    }

    async fn run<T: Transport>(
        self,
        client: &PortalClient<T>,
        context: &CommandContext,
        format: OutputFormat,
    ) -> Result<()> {
        match self {
            Self::Genres => {
                let genres = client.genres().await?;
                output(&genres, format, print_genre)
            }
            Self::VodCategories => {
                let categories = client.vod_categories().await?;
                output(&categories, format, print_genre)
            }
            Self::Channels {
                genre,
                page,
                refresh,
            } => {
                let channels = match page {
                    Some(page) => client.channels_page(genre.as_deref(), page).await?,
                    None => {
                        let pb = spinner("Fetching channels...".to_string());
                        let result = client.all_channels(refresh).await;
                        pb.finish_and_clear();
                        let channels = result?;
                        match genre_filter(genre.as_deref()) {
                            Some(id) => filter_by_genre(channels, id, &client.genres().await?),
                            None => channels,
                        }
                    }
                };
                output(&channels, format, print_channel)
            }
            Self::Vod {
                category,
                page,
                max_pages,
            } => {
                let items = match page {
                    Some(page) => client.vod_page(category.as_deref(), page).await?,
                    None => {
                        let limit = max_pages.or(context.settings().vod_page_limit);
                        let pb = spinner("Fetching VOD catalog...".to_string());
                        let result = client.all_vod_items(category.as_deref(), limit).await;
                        pb.finish_and_clear();
                        result?
                    }
                };
                output(&items, format, print_vod_item)
            }
        }
    }
}

/// Genre id to narrow by; empty and `*` mean no filtering.
fn genre_filter(genre: Option<&str>) -> Option<&str> {
    genre.filter(|g| !g.is_empty() && *g != "*")
}

/// The cached full list is unfiltered; narrow it by the genre's title.
fn filter_by_genre(channels: Vec<Channel>, id: &str, genres: &[Genre]) -> Vec<Channel> {
    match genres.iter().find(|g| g.id == id) {
        Some(genre) => channels
            .into_iter()
            .filter(|c| c.genre_title == genre.title)
            .collect(),
        None => {
            eprintln!("Warning: unknown genre id {}, showing all channels", id);
            channels
        }
    }
}

fn output<T: Serialize>(items: &[T], format: OutputFormat, print: fn(&T)) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(items)?),
        OutputFormat::Text => {
            if items.is_empty() {
                println!("Nothing found");
            }
            items.iter().for_each(print);
        }
    }
    Ok(())
}

fn print_genre(genre: &Genre) {
    println!("{:>6} | {}", genre.id, genre.title);
}

fn print_channel(channel: &Channel) {
    let hd = if channel.hd.unwrap_or(0) > 0 { " [HD]" } else { "" };
    println!(
        "{:>5} | {}{} | {} | {}",
        channel.number, channel.name, hd, channel.genre_title, channel.cmd
    );
}

fn print_vod_item(item: &VodItem) {
    println!(
        "{:>8} | {} ({}) | {} | {}",
        item.id, item.name, item.year, item.category, item.cmd
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    use stb_portal::transport::PortalRequest;
    use stb_portal::{ClientError, ClientSettings, Config, DeviceProfile};
    use std::collections::VecDeque;
    use std::sync::Mutex;

    #[derive(Default)]
    struct QueuedTransport {
        bodies: Mutex<VecDeque<String>>,
        urls: Mutex<Vec<String>>,
    }

    #[async_trait::async_trait]
    impl Transport for QueuedTransport {
        async fn get(&self, request: PortalRequest) -> stb_portal::Result<String> {
            self.urls.lock().unwrap().push(request.url);
            self.bodies
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| ClientError::Network("no response queued".into()))
        }
    }

    fn channel(id: &str, genre: &str) -> Channel {
        serde_json::from_value(serde_json::json!({"id": id, "tv_genre_title": genre})).unwrap()
    }

    #[test]
    fn test_filter_by_genre() {
        let genres = vec![Genre {
            id: "2".into(),
            title: "Sport".into(),
        }];
        let channels = vec![channel("1", "News"), channel("2", "Sport")];

        let sport = filter_by_genre(channels.clone(), "2", &genres);
        assert_eq!(sport.len(), 1);
        assert_eq!(sport[0].id, "2");

        assert_eq!(filter_by_genre(channels, "99", &genres).len(), 2);
    }

    #[test]
    fn test_genre_filter_skips_wildcards() {
        assert_eq!(genre_filter(None), None);
        assert_eq!(genre_filter(Some("")), None);
        assert_eq!(genre_filter(Some("*")), None);
        assert_eq!(genre_filter(Some("7")), Some("7"));
    }

    #[tokio::test]
    async fn test_failed_listing_still_logs_out() {
        let transport = QueuedTransport::default();
        {
            let mut bodies = transport.bodies.lock().unwrap();
            bodies.push_back(r#"{"js":{"token":"T"}}"#.into());
            bodies.push_back(r#"{"js":{"id":"42"}}"#.into());
            bodies.push_back("<html>maintenance</html>".into());
            bodies.push_back(r#"{"js":true}"#.into());
        }
        let settings = ClientSettings {
            handshake_delay_ms: 0,
            ..ClientSettings::default()
        };
        let client = PortalClient::with_transport(transport, settings);
        client
            .authenticate(DeviceProfile::new("http://portal.example.com", "00:1A:79:12:34:56"))
            .await
            .unwrap();

        let context = CommandContext::new(Config::default(), None);
        let result = ListCommand::Genres
            .run_then_logout(&client, &context, OutputFormat::Json)
            .await;

        assert!(result.is_err());
        assert!(!client.is_authenticated());
        let urls = client.transport().urls.lock().unwrap().clone();
        assert_eq!(urls.len(), 4);
        assert!(urls[2].contains("action=get_genres"));
        assert!(urls[3].contains("action=logout"));
    }
}
