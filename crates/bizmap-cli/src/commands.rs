//! Command handlers. Each invocation restores the saved session, loads the
//! city's records, applies the requested change, prints, and saves again.

use std::io::Write;

use anyhow::Context;
use bizmap_client::DirectoryClient;
use bizmap_core::AppConfig;
use bizmap_view::{
    industry_facets, load_city, FileSessionStore, SelectionMode, SessionStore, ViewOrchestrator,
};

use crate::render;
use crate::{BrowseArgs, SelectAction};

/// Restores the orchestrator from `store`, or starts fresh.
///
/// An unreadable session is logged and discarded rather than blocking the
/// command.
pub(crate) fn restore_orchestrator(store: &impl SessionStore, page_size: usize) -> ViewOrchestrator {
    match store.load() {
        Ok(Some(snapshot)) => ViewOrchestrator::from_session(snapshot),
        Ok(None) => ViewOrchestrator::with_page_size(page_size),
        Err(e) => {
            tracing::warn!(error = %e, "ignoring unreadable session");
            ViewOrchestrator::with_page_size(page_size)
        }
    }
}

/// The explicit `--city`, else the session's city, else the configured default.
pub(crate) fn resolve_city(
    explicit: Option<&str>,
    orchestrator: &ViewOrchestrator,
    config: &AppConfig,
) -> anyhow::Result<String> {
    explicit
        .or_else(|| orchestrator.filter().city())
        .or(config.default_city.as_deref())
        .map(|c| c.trim().to_owned())
        .filter(|c| !c.is_empty())
        .ok_or_else(|| {
            anyhow::anyhow!("no city chosen; pass --city or set BIZMAP_DEFAULT_CITY")
        })
}

/// Saves the session unless the records failed to load.
///
/// Paging and selection are meaningless against an empty fallback view, so
/// writing them back would overwrite the user's last good state. Returns
/// whether anything was written.
pub(crate) fn persist_session(
    store: &impl SessionStore,
    orchestrator: &ViewOrchestrator,
    loaded: bool,
) -> anyhow::Result<bool> {
    if !loaded {
        tracing::warn!("records failed to load, keeping the previous session");
        return Ok(false);
    }
    store
        .save(&orchestrator.session_snapshot())
        .context("failed to save session")?;
    Ok(true)
}

struct Workspace {
    store: FileSessionStore,
    orchestrator: ViewOrchestrator,
    loaded: bool,
}

impl Workspace {
    /// Restores the session and loads `city` into it.
    ///
    /// A failed fetch is reported and leaves an empty record set so the rest
    /// of the command still runs; the session is then left untouched.
    async fn open(config: &AppConfig, city: Option<&str>) -> anyhow::Result<Self> {
        let store = FileSessionStore::new(&config.session_path);
        let mut orchestrator = restore_orchestrator(&store, config.page_size);
        let city = resolve_city(city, &orchestrator, config)?;

        let client = DirectoryClient::new(config).context("failed to build directory client")?;
        let loaded = match load_city(&mut orchestrator, &client, &city).await {
            Ok(_) => true,
            Err(e) => {
                eprintln!("could not load records for {city}: {e}; session not saved");
                false
            }
        };
        Ok(Self {
            store,
            orchestrator,
            loaded,
        })
    }

    fn save(&self) -> anyhow::Result<()> {
        persist_session(&self.store, &self.orchestrator, self.loaded)
            .with_context(|| format!("session path {}", self.store.path().display()))?;
        Ok(())
    }
}

/// Print every city the directory knows about.
///
/// # Errors
///
/// Returns an error if the directory request fails.
pub(crate) async fn run_cities(config: &AppConfig) -> anyhow::Result<()> {
    let client = DirectoryClient::new(config).context("failed to build directory client")?;
    let cities = client
        .fetch_city_list()
        .await
        .context("failed to fetch city list")?;
    if cities.is_empty() {
        println!("directory returned no cities");
        return Ok(());
    }
    for city in &cities {
        println!("{city}");
    }
    Ok(())
}

/// Apply browse flags in a fixed order: filters, sort, paging, then view.
///
/// Filters go first so an explicit `--page` is clamped against the new
/// filtered set rather than the old one.
pub(crate) fn apply_browse(orchestrator: &mut ViewOrchestrator, args: &BrowseArgs) {
    if args.reset {
        orchestrator.reset_filters();
    }
    if let Some(term) = &args.search {
        orchestrator.set_search_term(term);
    }
    if !args.industries.is_empty() {
        orchestrator.set_selected_industries(args.industries.iter().map(|c| c.trim().to_owned()));
    }
    if args.clear_location {
        orchestrator.set_user_location(None);
        orchestrator.set_distance_limit(None);
    }
    if let Some(location) = args.near {
        orchestrator.set_user_location(Some(location));
    }
    if let Some(radius) = args.radius {
        orchestrator.set_distance_limit(Some(radius));
    }
    if let Some(sort) = &args.sort {
        orchestrator.set_sort_descriptor(sort.clone());
    }

    if let Some(size) = args.page_size {
        orchestrator.set_page_size(size);
    }
    if let Some(page) = args.page {
        orchestrator.set_page(page);
    } else if args.next {
        orchestrator.next_page();
    } else if args.prev {
        orchestrator.previous_page();
    }

    if let Some(mode) = args.view {
        orchestrator.set_view_mode(mode);
    }
    if args.reset_columns {
        orchestrator.reset_columns();
    }
    for column in &args.toggle_columns {
        orchestrator.toggle_column_visibility(*column);
    }
}

/// Render the current view and persist any changes.
///
/// # Errors
///
/// Returns an error if no city can be resolved, output fails, or the session
/// cannot be saved.
pub(crate) async fn run_browse(config: &AppConfig, args: &BrowseArgs) -> anyhow::Result<()> {
    let mut workspace = Workspace::open(config, args.city.as_deref()).await?;
    apply_browse(&mut workspace.orchestrator, args);

    let mut out = std::io::stdout().lock();
    if args.columns {
        render::write_column_list(&mut out, workspace.orchestrator.view().visible_columns())?;
    } else {
        render::write_view(&mut out, &workspace.orchestrator)?;
    }
    out.flush()?;
    workspace.save()
}

/// Apply one selection action. Returns a note for the user when the action
/// was ignored.
pub(crate) fn apply_select(
    orchestrator: &mut ViewOrchestrator,
    action: &SelectAction,
) -> Option<String> {
    if let Some(id) = &action.toggle {
        let id = id.trim();
        if !orchestrator.toggle_selection(id) {
            return Some(format!("{id} is not among the loaded records; selection unchanged"));
        }
    } else if action.all {
        orchestrator.select_all_filtered();
    } else if action.page {
        if orchestrator.selection().mode() == SelectionMode::AllFiltered {
            return Some(
                "all matching records are already selected; --page has no effect".to_owned(),
            );
        }
        orchestrator.select_page();
    } else if action.clear {
        orchestrator.clear_selection();
    }
    None
}

/// Change the selection and print the selected ids.
///
/// # Errors
///
/// Returns an error if no city can be resolved or the session cannot be saved.
pub(crate) async fn run_select(
    config: &AppConfig,
    city: Option<&str>,
    action: &SelectAction,
) -> anyhow::Result<()> {
    let mut workspace = Workspace::open(config, city).await?;
    if let Some(note) = apply_select(&mut workspace.orchestrator, action) {
        eprintln!("{note}");
    }

    let mut out = std::io::stdout().lock();
    render::write_selection(&mut out, &workspace.orchestrator)?;
    out.flush()?;
    workspace.save()
}

/// Print industry facets for the loaded city, marking active filters.
///
/// # Errors
///
/// Returns an error if no city can be resolved or the session cannot be saved.
pub(crate) async fn run_facets(config: &AppConfig, city: Option<&str>) -> anyhow::Result<()> {
    let workspace = Workspace::open(config, city).await?;
    let facets = industry_facets(workspace.orchestrator.records());

    let mut out = std::io::stdout().lock();
    render::write_facets(
        &mut out,
        &facets,
        &workspace.orchestrator.criteria().selected_industries,
    )?;
    out.flush()?;
    workspace.save()
}
