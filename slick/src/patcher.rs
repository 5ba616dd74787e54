use slick_protocol::RegionPayload;
use tracing::debug;

use crate::loader::ResourceLoader;
use crate::platform::{Browser, Document};
use crate::{Region, ResourceKind, Result, SlickConfig};

/// Applies one region of a navigation response to the live document.
#[derive(Debug)]
pub struct Patcher<'a, B> {
    browser: &'a B,
    config: &'a SlickConfig,
}

impl<'a, B: Browser> Patcher<'a, B> {
    pub fn new(browser: &'a B, config: &'a SlickConfig) -> Self {
        Self { browser, config }
    }

    /// Swap `region` to `payload`.
    ///
    /// Stale stylesheets stay mounted until the new ones have loaded so the region is
    /// never shown unstyled. Stale scripts are removed before the new ones load since
    /// running both is not safe.
    pub async fn swap_region(&self, region: Region, payload: &RegionPayload) -> Result<()> {
        let document = self.browser.document();
        let loader = ResourceLoader::new(self.browser, self.config);

        document.replace_head(region, &payload.head)?;

        let stale_styles = document.resources(ResourceKind::Style, region);
        loader.load_styles(&payload.styles, region).await;

        document.replace_body(region, &payload.body)?;

        for style in &stale_styles {
            document.remove_resource(style);
        }
        let stale_scripts = document.resources(ResourceKind::Script, region);
        for script in &stale_scripts {
            document.remove_resource(script);
        }

        loader.load_scripts(&payload.scripts, region).await;

        debug!(
            %region,
            removed_styles = stale_styles.len(),
            removed_scripts = stale_scripts.len(),
            "region swapped"
        );
        Ok(())
    }
}
