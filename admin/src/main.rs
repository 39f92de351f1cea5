//! `elephant`: terminal console for the Elephant Party site and admin.
//!
//! Every command drives one page store through the same actions the page
//! would see and prints the rendered state.

use anyhow::{bail, Context};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use elephant_admin::features::dashboard::{DashboardAction, DashboardReducer, DashboardState};
use elephant_admin::features::door::{DoorAction, DoorReducer, DoorState};
use elephant_admin::features::downloads::{DownloadsAction, DownloadsReducer, DownloadsState};
use elephant_admin::features::event_creator::{
    EventCreatorAction, EventCreatorReducer, EventCreatorState,
};
use elephant_admin::features::event_editor::{
    DraftEdit, EventEditorAction, EventEditorReducer, EventEditorState,
};
use elephant_admin::features::pages::{ContentAction, ContentPage, ContentReducer, ContentState};
use elephant_admin::features::public_events::{ListingAction, ListingReducer, ListingState};
use elephant_admin::features::purchase::{PurchaseAction, PurchaseReducer, PurchaseState};
use elephant_admin::features::session::{SessionAction, SessionReducer, SessionState};
use elephant_admin::features::ticket_desk::{TicketDeskAction, TicketDeskReducer, TicketDeskState};
use elephant_admin::reports::{FsReportSink, ReportArg};
use elephant_admin::ticket_form::FormEdit;
use elephant_admin::tickets::SortKey;
use elephant_admin::{render, Config, PageEnvironment, PageError, Route};
use elephant_client::{AttendeeId, BackendClient, EventId, PaymentType, TicketId, Upload, WalkInAdjustment};
use elephant_core::environment::SystemClock;
use elephant_core::reducer::Reducer;
use elephant_runtime::Store;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "elephant", author, version, about = "Elephant Party tickets from the terminal")]
struct Cli {
    /// Backend base URL (overrides ELEPHANT_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Where downloaded reports are written (overrides ELEPHANT_REPORT_DIR)
    #[arg(long, global = true)]
    report_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Upcoming and past events
    Events {
        /// Page to show
        #[arg(long, default_value_t = 1)]
        page: usize,
    },
    /// One public event
    Event {
        /// Event id
        id: EventId,
    },
    /// Buy tickets for an event
    Buy {
        /// Event id
        id: EventId,
        #[command(flatten)]
        form: BuyerArgs,
    },
    /// About or contact page
    Page {
        /// about or contact
        name: ContentPage,
    },
    /// Admin commands (log in with the configured credentials first)
    Admin {
        #[command(subcommand)]
        command: AdminCommand,
    },
}

#[derive(Subcommand, Debug)]
enum AdminCommand {
    /// Dashboard of all events
    Events {
        /// Also list inactive events
        #[arg(long)]
        all: bool,
    },
    /// Manage one event
    Event {
        #[command(subcommand)]
        command: EventCommand,
    },
    /// Ticket purchases of an event
    Tickets {
        /// Event id
        event: EventId,
        /// Filter by buyer, attendee, email, phone or reference
        #[arg(long, default_value = "")]
        search: String,
        /// Column to sort by
        #[arg(long)]
        sort: Option<SortKey>,
        /// Sort descending
        #[arg(long, requires = "sort")]
        desc: bool,
    },
    /// Create, update or delete a ticket purchase
    Ticket {
        #[command(subcommand)]
        command: TicketCommand,
    },
    /// Door check-in list
    Door {
        /// Event id
        event: EventId,
        /// Filter attendees by name or group
        #[arg(long, default_value = "")]
        search: String,
    },
    /// Flip an attendee's check-in
    CheckIn {
        /// Event id
        event: EventId,
        /// Attendee id
        attendee: AttendeeId,
    },
    /// Change a walk-in counter
    WalkIn {
        /// Event id
        event: EventId,
        /// cash or gcash
        payment_type: PaymentType,
        /// inc or dec
        adjustment: Adjust,
    },
    /// Download a PDF report
    Report {
        /// Event id
        event: EventId,
        /// attendees, accounting or emails
        kind: ReportArg,
    },
}

#[derive(Subcommand, Debug)]
enum EventCommand {
    /// Show an event
    Show {
        /// Event id
        id: EventId,
    },
    /// Create an event from defaults
    Create {
        /// Title
        #[arg(long)]
        title: String,
        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        start_date: NaiveDate,
        /// Poster image
        #[arg(long)]
        poster: Option<PathBuf>,
    },
    /// Change event fields
    Update {
        /// Event id
        id: EventId,
        #[command(flatten)]
        fields: EventFields,
    },
    /// Open or close sales
    Toggle {
        /// Event id
        id: EventId,
    },
    /// Delete an event and its tickets
    Delete {
        /// Event id
        id: EventId,
        /// Confirm the delete
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Args, Debug, Default)]
struct EventFields {
    #[arg(long)]
    title: Option<String>,
    #[arg(long)]
    display_date: Option<String>,
    #[arg(long)]
    venue_name: Option<String>,
    #[arg(long)]
    venue_address: Option<String>,
    #[arg(long)]
    event_time: Option<String>,
    #[arg(long)]
    description: Option<String>,
    #[arg(long)]
    email_template: Option<String>,
    #[arg(long)]
    price: Option<f64>,
    #[arg(long)]
    bundle_price: Option<f64>,
    #[arg(long)]
    bundle_size: Option<u32>,
    /// Remove the bundle offer
    #[arg(long, conflicts_with_all = ["bundle_price", "bundle_size"])]
    no_bundle: bool,
    #[arg(long)]
    max_tickets: Option<u32>,
    #[arg(long)]
    ticket_deadline: Option<String>,
    #[arg(long)]
    inactive_message: Option<String>,
    #[arg(long)]
    start_date: Option<NaiveDate>,
    #[arg(long)]
    walk_in_price: Option<f64>,
    /// New poster image
    #[arg(long)]
    poster: Option<PathBuf>,
}

impl EventFields {
    fn edits(&self) -> Vec<DraftEdit> {
        let mut edits = Vec::new();
        let mut push = |edit: Option<DraftEdit>| edits.extend(edit);

        push(self.title.clone().map(DraftEdit::Title));
        push(self.display_date.clone().map(DraftEdit::DisplayDate));
        push(self.venue_name.clone().map(DraftEdit::VenueName));
        push(self.venue_address.clone().map(DraftEdit::VenueAddress));
        push(self.event_time.clone().map(DraftEdit::EventTime));
        push(self.description.clone().map(DraftEdit::Description));
        push(self.email_template.clone().map(DraftEdit::EmailTemplate));
        push(self.price.map(DraftEdit::RegularPrice));
        push(self.bundle_price.map(|p| DraftEdit::BundlePrice(Some(p))));
        push(self.bundle_size.map(|s| DraftEdit::BundleSize(Some(s))));
        if self.no_bundle {
            push(Some(DraftEdit::BundlePrice(None)));
            push(Some(DraftEdit::BundleSize(None)));
        }
        push(self.max_tickets.map(DraftEdit::MaxTickets));
        push(self.ticket_deadline.clone().map(DraftEdit::TicketDeadline));
        push(self.inactive_message.clone().map(|m| DraftEdit::InactiveMessage(Some(m))));
        push(self.start_date.map(DraftEdit::StartDate));
        push(self.walk_in_price.map(DraftEdit::WalkInPrice));
        edits
    }
}

#[derive(Subcommand, Debug)]
enum TicketCommand {
    /// Record a purchase
    Create {
        /// Event id
        event: EventId,
        #[command(flatten)]
        form: BuyerArgs,
        /// Amount paid
        #[arg(long)]
        total_price: String,
    },
    /// Change a purchase
    Update {
        /// Event id
        event: EventId,
        /// Ticket id
        ticket: TicketId,
        #[command(flatten)]
        form: BuyerArgs,
        /// Amount paid
        #[arg(long)]
        total_price: Option<String>,
    },
    /// Delete a purchase
    Delete {
        /// Event id
        event: EventId,
        /// Ticket id
        ticket: TicketId,
        /// Confirm the delete
        #[arg(long)]
        yes: bool,
    },
}

/// Buyer, attendee and contact fields shared by purchases and admin tickets
#[derive(Args, Debug, Default)]
struct BuyerArgs {
    /// Buyer name (also the first attendee)
    #[arg(long)]
    buyer: Option<String>,
    /// Further attendees, in order; replaces the existing ones
    #[arg(long = "attendee")]
    attendees: Vec<String>,
    #[arg(long)]
    phone: Option<String>,
    #[arg(long)]
    email: Option<String>,
    #[arg(long)]
    reference: Option<String>,
    /// Proof of payment image
    #[arg(long)]
    payslip: Option<PathBuf>,
}

impl BuyerArgs {
    /// Form edits, given how many attendees the form holds now
    fn edits(&self, current_attendees: usize) -> anyhow::Result<Vec<FormEdit>> {
        let mut edits = Vec::new();
        if let Some(buyer) = &self.buyer {
            edits.push(FormEdit::BuyerName(buyer.clone()));
        }
        if !self.attendees.is_empty() {
            for index in (1..current_attendees).rev() {
                edits.push(FormEdit::RemoveAttendee(index));
            }
            for (offset, name) in self.attendees.iter().enumerate() {
                edits.push(FormEdit::AddAttendee);
                edits.push(FormEdit::Attendee {
                    index: offset + 1,
                    name: name.clone(),
                });
            }
        }
        if let Some(phone) = &self.phone {
            edits.push(FormEdit::Phone(phone.clone()));
        }
        if let Some(email) = &self.email {
            edits.push(FormEdit::Email(email.clone()));
        }
        if let Some(reference) = &self.reference {
            edits.push(FormEdit::ReferenceNumber(reference.clone()));
        }
        if let Some(path) = &self.payslip {
            let upload = Upload::from_path(path)
                .with_context(|| format!("reading payslip {}", path.display()))?;
            edits.push(FormEdit::Payslip(upload));
        }
        Ok(edits)
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Adjust {
    Inc,
    Dec,
}

impl From<Adjust> for WalkInAdjustment {
    fn from(adjust: Adjust) -> Self {
        match adjust {
            Adjust::Inc => Self::Increment,
            Adjust::Dec => Self::Decrement,
        }
    }
}

/// Store for one page
fn page<R>(state: R::State, reducer: R, env: &PageEnvironment) -> Store<R::State, R::Action, PageEnvironment, R>
where
    R: Reducer<Environment = PageEnvironment> + Send + Sync + 'static,
    R::State: Send + Sync + 'static,
    R::Action: Send + Clone + 'static,
{
    Store::new(state, reducer, env.clone())
}

/// Send actions one at a time, each with all of its follow-ups
async fn run<R>(
    store: &Store<R::State, R::Action, PageEnvironment, R>,
    actions: impl IntoIterator<Item = R::Action>,
) where
    R: Reducer<Environment = PageEnvironment> + Send + Sync + 'static,
    R::State: Send + Sync + 'static,
    R::Action: Send + Clone + 'static,
{
    for action in actions {
        store.send(action).await.wait().await;
    }
}

/// Print the page, then fail if it ended in an error or on the login page
fn finish(text: &str, error: Option<&PageError>, redirect: Option<Route>) -> anyhow::Result<()> {
    print!("{text}");
    if redirect == Some(Route::AdminLogin) {
        bail!("session expired, log in again");
    }
    if let Some(error) = error {
        bail!("{error}");
    }
    Ok(())
}

async fn login(config: &Config, env: &PageEnvironment) -> anyhow::Result<()> {
    let credentials = config.admin_credentials()?;
    let store = page(SessionState::default(), SessionReducer::new(), env);
    run(
        &store,
        [
            SessionAction::SetUsername(credentials.username),
            SessionAction::SetPassword(credentials.password),
            SessionAction::Login,
        ],
    )
    .await;

    let state = store.state(SessionState::clone).await;
    if !state.logged_in {
        bail!(state.error.unwrap_or_else(|| "Login failed".to_string()));
    }
    Ok(())
}

async fn dispatch(command: Command, config: &Config, env: &PageEnvironment) -> anyhow::Result<()> {
    match command {
        Command::Events { page: number } => {
            let store = page(ListingState::new(config.page_size), ListingReducer::new(), env);
            run(&store, [ListingAction::Load, ListingAction::GoToPage(number)]).await;
            let (text, error) = store
                .state(|s| (render::listing(s), s.events.error().cloned()))
                .await;
            finish(&text, error.as_ref(), None)
        },
        Command::Event { id } => {
            let store = page(PurchaseState::new(id), PurchaseReducer::new(), env);
            run(&store, [PurchaseAction::Load]).await;
            let (text, error) = store
                .state(|s| (render::purchase(s), s.event.error().cloned()))
                .await;
            finish(&text, error.as_ref(), None)
        },
        Command::Buy { id, form } => {
            let store = page(PurchaseState::new(id), PurchaseReducer::new(), env);
            let mut actions = vec![PurchaseAction::Load];
            actions.extend(form.edits(1)?.into_iter().map(PurchaseAction::Edit));
            actions.push(PurchaseAction::Submit);
            run(&store, actions).await;

            let state = store.state(PurchaseState::clone).await;
            let error = state.event.error().cloned().or_else(|| {
                (!state.form_errors.is_empty()).then(|| PageError::Validation(state.form_errors.clone()))
            });
            finish(&render::purchase(&state), error.as_ref(), None)
        },
        Command::Page { name } => {
            let store = page(ContentState::new(name), ContentReducer::new(), env);
            run(&store, [ContentAction::Load]).await;
            finish(&store.state(render::content).await, None, None)
        },
        Command::Admin { command } => {
            login(config, env).await?;
            admin(command, env).await
        },
    }
}

#[allow(clippy::too_many_lines)] // One arm per admin command
async fn admin(command: AdminCommand, env: &PageEnvironment) -> anyhow::Result<()> {
    match command {
        AdminCommand::Events { all } => {
            let store = page(DashboardState::default(), DashboardReducer::new(), env);
            let mut actions = vec![DashboardAction::Load];
            if all {
                actions.push(DashboardAction::ToggleInactive);
            }
            run(&store, actions).await;
            let state = store.state(DashboardState::clone).await;
            finish(&render::dashboard(&state), state.events.error(), state.redirect)
        },

        AdminCommand::Event { command } => event_command(command, env).await,

        AdminCommand::Tickets {
            event,
            search,
            sort,
            desc,
        } => {
            let store = page(TicketDeskState::new(event), TicketDeskReducer::new(), env);
            let mut actions = vec![TicketDeskAction::Load, TicketDeskAction::SetSearch(search)];
            if let Some(key) = sort {
                actions.push(TicketDeskAction::SortBy(key));
                if desc {
                    actions.push(TicketDeskAction::SortBy(key));
                }
            }
            run(&store, actions).await;
            let state = store.state(TicketDeskState::clone).await;
            let error = state.event.error().or(state.error.as_ref());
            finish(&render::ticket_desk(&state), error, state.redirect)
        },

        AdminCommand::Ticket { command } => ticket_command(command, env).await,

        AdminCommand::Door { event, search } => {
            let store = page(DoorState::new(event), DoorReducer::new(), env);
            run(&store, [DoorAction::Load, DoorAction::SetSearch(search)]).await;
            let state = store.state(DoorState::clone).await;
            finish(&render::door(&state), state.list.error(), state.redirect)
        },

        AdminCommand::CheckIn { event, attendee } => {
            let store = page(DoorState::new(event), DoorReducer::new(), env);
            run(&store, [DoorAction::Load, DoorAction::ToggleCheckIn(attendee)]).await;
            let state = store.state(DoorState::clone).await;
            let error = state.list.error().or(state.error.as_ref());
            finish(&render::door(&state), error, state.redirect)
        },

        AdminCommand::WalkIn {
            event,
            payment_type,
            adjustment,
        } => {
            let store = page(DoorState::new(event), DoorReducer::new(), env);
            run(
                &store,
                [
                    DoorAction::Load,
                    DoorAction::AdjustWalkIn {
                        payment_type,
                        adjustment: adjustment.into(),
                    },
                ],
            )
            .await;
            let state = store.state(DoorState::clone).await;
            let error = state.list.error().or(state.error.as_ref());
            finish(&render::door(&state), error, state.redirect)
        },

        AdminCommand::Report { event, kind } => {
            let store = page(DownloadsState::new(event), DownloadsReducer::new(), env);
            run(&store, [DownloadsAction::Load, DownloadsAction::Download(kind.0)]).await;
            let state = store.state(DownloadsState::clone).await;
            let error = state.event.error().or(state.error.as_ref());
            finish(&render::downloads(&state), error, state.redirect)
        },
    }
}

async fn event_command(command: EventCommand, env: &PageEnvironment) -> anyhow::Result<()> {
    let (id, actions) = match command {
        EventCommand::Show { id } => (id, vec![]),
        EventCommand::Toggle { id } => (id, vec![EventEditorAction::ToggleActive]),
        EventCommand::Delete { id, yes } => {
            if !yes {
                bail!("deleting event {id} also deletes its tickets; pass --yes to confirm");
            }
            (id, vec![EventEditorAction::RequestDelete, EventEditorAction::ConfirmDelete])
        },
        EventCommand::Update { id, fields } => {
            let mut actions: Vec<_> = fields.edits().into_iter().map(EventEditorAction::Edit).collect();
            if let Some(path) = &fields.poster {
                let upload = Upload::from_path(path)
                    .with_context(|| format!("reading poster {}", path.display()))?;
                actions.push(EventEditorAction::SetPoster(upload));
            }
            actions.push(EventEditorAction::Save);
            (id, actions)
        },
        EventCommand::Create {
            title,
            start_date,
            poster,
        } => {
            let store = page(EventCreatorState::default(), EventCreatorReducer::new(), env);
            let mut actions = vec![
                EventCreatorAction::Load,
                EventCreatorAction::SetTitle(title),
                EventCreatorAction::SetStartDate(start_date),
            ];
            if let Some(path) = poster {
                let upload = Upload::from_path(&path)
                    .with_context(|| format!("reading poster {}", path.display()))?;
                actions.push(EventCreatorAction::SetPoster(upload));
            }
            actions.push(EventCreatorAction::Submit);
            run(&store, actions).await;

            let state = store.state(EventCreatorState::clone).await;
            let created = match state.redirect {
                Some(Route::AdminEvent(id)) => id,
                redirect => {
                    let error = state.error.as_ref().or(state.latest.error());
                    return finish("", error, redirect);
                },
            };
            println!("Created event {created}");
            (created, vec![])
        },
    };

    let store = page(EventEditorState::new(id), EventEditorReducer::new(), env);
    let mut all = vec![EventEditorAction::Load];
    all.extend(actions);
    run(&store, all).await;

    let state = store.state(EventEditorState::clone).await;
    if state.redirect == Some(Route::AdminDashboard) {
        println!("Deleted event {id}");
        return Ok(());
    }
    let error = state.event.error().or(state.error.as_ref());
    finish(&render::event_detail(&state), error, state.redirect)
}

async fn ticket_command(command: TicketCommand, env: &PageEnvironment) -> anyhow::Result<()> {
    let (event, actions) = match command {
        TicketCommand::Create {
            event,
            form,
            total_price,
        } => {
            let mut actions = vec![TicketDeskAction::OpenCreateForm];
            actions.extend(form.edits(1)?.into_iter().map(TicketDeskAction::Edit));
            actions.push(TicketDeskAction::SetTotalPrice(total_price));
            actions.push(TicketDeskAction::Submit);
            (event, actions)
        },
        TicketCommand::Update {
            event,
            ticket,
            form,
            total_price,
        } => {
            let store = page(TicketDeskState::new(event), TicketDeskReducer::new(), env);
            run(&store, [TicketDeskAction::Load, TicketDeskAction::EditTicket(ticket)]).await;
            let Some(current) = store
                .state(|s| s.form.as_ref().map(|f| f.names.attendees().len()))
                .await
            else {
                let state = store.state(TicketDeskState::clone).await;
                let error = state.event.error().cloned().unwrap_or_else(|| {
                    PageError::NotFound(format!("Ticket {ticket} not found for event {event}"))
                });
                return finish("", Some(&error), state.redirect);
            };

            let mut actions: Vec<_> = form
                .edits(current)?
                .into_iter()
                .map(TicketDeskAction::Edit)
                .collect();
            if let Some(price) = total_price {
                actions.push(TicketDeskAction::SetTotalPrice(price));
            }
            actions.push(TicketDeskAction::Submit);
            run(&store, actions).await;
            return ticket_outcome(&store).await;
        },
        TicketCommand::Delete { event, ticket, yes } => {
            if !yes {
                bail!("pass --yes to delete ticket {ticket}");
            }
            (
                event,
                vec![
                    TicketDeskAction::RequestDelete(ticket),
                    TicketDeskAction::ConfirmDelete,
                ],
            )
        },
    };

    let store = page(TicketDeskState::new(event), TicketDeskReducer::new(), env);
    let mut all = vec![TicketDeskAction::Load];
    all.extend(actions);
    run(&store, all).await;
    ticket_outcome(&store).await
}

async fn ticket_outcome(
    store: &Store<TicketDeskState, TicketDeskAction, PageEnvironment, TicketDeskReducer>,
) -> anyhow::Result<()> {
    let state = store.state(TicketDeskState::clone).await;
    let error = state.event.error().cloned().or_else(|| state.error.clone()).or_else(|| {
        (!state.form_errors.is_empty()).then(|| PageError::Validation(state.form_errors.clone()))
    });
    finish(&render::ticket_desk(&state), error.as_ref(), state.redirect)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,elephant_admin=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let mut config = Config::from_env()?;
    if let Some(api_url) = cli.api_url {
        config.api_url = api_url;
    }
    if let Some(report_dir) = cli.report_dir {
        config.report_dir = report_dir;
    }
    tracing::debug!(
        api_url = %config.api_url,
        report_dir = %config.report_dir.display(),
        utc_offset = %config.utc_offset(),
        "Configuration loaded"
    );

    let client = BackendClient::new(config.api_url.clone())?;
    let env = PageEnvironment::new(
        Arc::new(client),
        Arc::new(SystemClock),
        Arc::new(FsReportSink::new(config.report_dir.clone())),
    )
    .with_redirect_delay(config.redirect_delay())
    .with_utc_offset(config.utc_offset());

    dispatch(cli.command, &config, &env).await
}
