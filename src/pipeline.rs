//! Per-entity discovery pipeline
//!
//! One entity flows through four phases: candidate generation, probing,
//! department link discovery, and extraction. Every phase is best-effort;
//! the pipeline always produces a result, degrading to a manual-research
//! item when automation comes up empty.

use std::time::Duration;

use crate::candidates;
use crate::config::AppConfig;
use crate::entity::{Entity, EntityResult, ManualResearchItem, ResolutionStatus};
use crate::extract;
use crate::links;
use crate::logger::RunLogger;
use crate::probe::ProbeClient;

/// The pipeline's output for one entity
#[derive(Debug)]
pub struct EntityOutcome {
    pub result: EntityResult,
    /// Present when a human should finish the job (partial or unresolved)
    pub manual: Option<ManualResearchItem>,
}

pub struct Pipeline<'a> {
    config: &'a AppConfig,
    probe: ProbeClient,
    logger: &'a RunLogger,
}

impl<'a> Pipeline<'a> {
    pub fn new(config: &'a AppConfig, logger: &'a RunLogger) -> anyhow::Result<Self> {
        let probe = ProbeClient::new(&config.http)?;
        Ok(Self {
            config,
            probe,
            logger,
        })
    }

    /// Run the full discovery flow for one entity.
    ///
    /// Never fails: network and parse problems degrade the result rather
    /// than abort it. A fixed pause follows every successful page fetch.
    pub async fn process_entity(&self, entity: &Entity) -> EntityOutcome {
        let patterns = self.config.patterns_for(entity.category);
        let candidate_urls = candidates::generate(entity, patterns);

        let (site, root_page) = match self.probe.probe_candidates(&candidate_urls).await {
            Some((candidate, page)) => (candidate, page),
            None => {
                self.logger
                    .log_site_not_found(&entity.name, candidate_urls.len());
                // Exhausted entities still pace the run so the next
                // entity's probes are not issued back-to-back
                self.pause().await;
                return EntityOutcome {
                    result: EntityResult::unresolved(entity.clone()),
                    manual: Some(self.manual_item(entity)),
                };
            }
        };

        self.logger.log_site_found(&entity.name, &root_page.final_url);
        self.pause().await;

        let mut result = EntityResult {
            entity: entity.clone(),
            site_url: Some(root_page.final_url.clone()),
            department_pages: Vec::new(),
            emails: extract::extract_emails(
                &root_page.html,
                &root_page.final_url,
                &self.config.extraction.email_blacklist,
            ),
            contacts: extract::extract_contacts(
                &root_page.html,
                &root_page.final_url,
                &self.config.extraction.title_keywords,
            ),
            status: ResolutionStatus::Partial,
        };
        tracing::debug!(
            entity = %entity.name,
            site = %site.url,
            pattern = %site.pattern,
            "site resolved"
        );

        let keywords = self.config.department_keywords_for(entity.category);
        let mut department_links =
            links::discover_department_links(&root_page.html, &root_page.final_url, keywords);
        department_links.truncate(self.config.crawl.max_links_per_site);

        for link in department_links {
            let page = match self.probe.fetch_page(&link).await {
                Some(page) => page,
                // Failed department pages are silently omitted; the root
                // page result stands on its own
                None => continue,
            };

            self.logger.log_department_page(&page.final_url);
            result.department_pages.push(page.final_url.clone());
            result.emails.extend(extract::extract_emails(
                &page.html,
                &page.final_url,
                &self.config.extraction.email_blacklist,
            ));
            result.contacts.extend(extract::extract_contacts(
                &page.html,
                &page.final_url,
                &self.config.extraction.title_keywords,
            ));
            self.pause().await;
        }

        let extracted_anything = !result.emails.is_empty() || !result.contacts.is_empty();
        result.status = if extracted_anything {
            ResolutionStatus::Found
        } else {
            ResolutionStatus::Partial
        };

        let manual = if extracted_anything {
            None
        } else {
            Some(self.manual_item(entity))
        };

        EntityOutcome { result, manual }
    }

    fn manual_item(&self, entity: &Entity) -> ManualResearchItem {
        ManualResearchItem {
            entity_name: entity.name.clone(),
            state: entity.state.clone(),
            category: entity.category,
            search_query: format!(
                "{} {} {}",
                entity.name,
                entity.state,
                self.config.search_term_for(entity.category)
            ),
        }
    }

    async fn pause(&self) {
        let delay = self.config.crawl.request_delay_secs;
        if delay > 0 {
            tokio::time::sleep(Duration::from_secs(delay)).await;
        }
    }
}
