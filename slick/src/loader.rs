use futures_util::future::{self, Either, LocalBoxFuture};
use slick_protocol::cache_bust;
use tracing::{debug, warn};

use crate::platform::{Browser, Document, ResourceSpec};
use crate::{Region, ResourceKind, SlickConfig};

/// Loads batches of stylesheets and scripts for one region.
///
/// A batch resolves once every resource has loaded, failed or timed out. Failures are
/// logged and otherwise ignored: the page stays usable with the asset missing.
#[derive(Debug)]
pub struct ResourceLoader<'a, B> {
    browser: &'a B,
    config: &'a SlickConfig,
}

impl<'a, B: Browser> ResourceLoader<'a, B> {
    pub fn new(browser: &'a B, config: &'a SlickConfig) -> Self {
        Self { browser, config }
    }

    /// Load stylesheets as-is; they are assumed immutable per URL.
    pub async fn load_styles(&self, urls: &[String], region: Region) -> usize {
        self.load_batch(ResourceKind::Style, urls.to_vec(), region)
            .await
    }

    /// Load scripts with a per-navigation cache-busting parameter.
    pub async fn load_scripts(&self, urls: &[String], region: Region) -> usize {
        let stamp = self.browser.now_millis();
        let busted = urls
            .iter()
            .map(|src| cache_bust(src, &self.config.cache_bust_param, stamp))
            .collect();

        self.load_batch(ResourceKind::Script, busted, region).await
    }

    /// Returns how many resources loaded successfully.
    async fn load_batch(&self, kind: ResourceKind, urls: Vec<String>, region: Region) -> usize {
        if urls.is_empty() {
            return 0;
        }

        let total = urls.len();
        let loads = urls.into_iter().map(|url| {
            let spec = ResourceSpec {
                kind,
                url: url.clone(),
                region,
                script_type: match kind {
                    ResourceKind::Script => self.config.script_type.clone(),
                    ResourceKind::Style => None,
                },
            };
            let load = self.browser.document().load_resource(spec);

            self.bounded(url, load)
        });

        let loaded = future::join_all(loads)
            .await
            .into_iter()
            .filter(|ok| *ok)
            .count();

        debug!(?kind, %region, loaded, total, "resource batch settled");
        loaded
    }

    async fn bounded(&self, url: String, load: LocalBoxFuture<'static, crate::Result<()>>) -> bool {
        let result = match self.config.resource_timeout_ms {
            None => load.await,
            Some(millis) => match future::select(load, self.browser.delay(millis)).await {
                Either::Left((result, _)) => result,
                Either::Right(_) => {
                    warn!(%url, millis, "resource timed out, continuing without it");
                    return false;
                }
            },
        };

        match result {
            Ok(()) => true,
            Err(error) => {
                warn!(%url, %error, "resource failed, continuing without it");
                false
            }
        }
    }
}
