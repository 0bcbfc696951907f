use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use iced::widget::image::Handle;
use iced::widget::{column, container, row, vertical_rule};
use iced::{event, mouse, window, Element, Event, Length, Subscription, Task, Theme};
use rfd::AsyncFileDialog;

use compare_view::diff::{PixelDiffEngine, SharedEngine};
use compare_view::loader::{self, DropBatch, DropQueue, DropTarget, LoadedImage};
use compare_view::state::job::JobOutcome;
use compare_view::state::labels::HideTicket;
use compare_view::state::{
    CandidateId, Effects, HighlightColor, Input, SensitivityMode, Session, Snapshot,
};
use compare_view::{compose, CompareError, Settings};

mod ui;

/// File types offered by the pickers
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp", "webp", "tif", "tiff"];

/// How long a drop may keep delivering files when nothing else happens
const DROP_SETTLE: Duration = Duration::from_millis(100);

/// A load result that can travel inside a message
type Loaded = Result<LoadedImage, Arc<CompareError>>;

/// Main application state
struct CompareView {
    session: Session,
    engine: SharedEngine,
    /// Rebuilt after every update
    snapshot: Snapshot,
    /// Composed frame of the current candidate
    frame: Option<Handle>,
    frame_size: (u32, u32),
    drops: DropQueue,
}

/// Application messages (events)
#[derive(Debug, Clone)]
enum Message {
    PickReference,
    PickCandidates,
    ReferencePicked(Option<PathBuf>),
    CandidatesPicked(Vec<PathBuf>),
    ReferenceLoaded(PathBuf, Loaded),
    CandidatesLoaded(Vec<(PathBuf, Loaded)>),
    /// One file of a drop; the target depends on what the cursor hovers
    FileDropped(PathBuf),
    DropHovered(DropTarget),
    DropSettled,
    JobFinished(JobOutcome),
    Select(CandidateId),
    Delete(CandidateId),
    SensitivityChanged(SensitivityMode),
    HighlightChanged(HighlightColor),
    Pointer(Input),
    LabelsExpired(HideTicket),
    StatusExpired(HideTicket),
}

impl CompareView {
    fn new() -> (Self, Task<Message>) {
        let settings = Settings::load();
        let engine = PixelDiffEngine::shared((&settings).into());
        let session = Session::new(settings);
        log::info!("Compare view initialized");

        let mut app = CompareView {
            snapshot: session.snapshot(),
            session,
            engine,
            frame: None,
            frame_size: (0, 0),
            drops: DropQueue::default(),
        };
        app.refresh();

        (app, Task::none())
    }

    /// Handle application messages and update state
    fn update(&mut self, message: Message) -> Task<Message> {
        // A drop ends at the first event that is not another dropped file
        let drops = match message {
            Message::FileDropped(_) => Task::none(),
            _ => self.flush_drops(),
        };
        Task::batch([drops, self.handle(message)])
    }

    fn handle(&mut self, message: Message) -> Task<Message> {
        let effects = match message {
            Message::PickReference => {
                return Task::perform(pick_reference(), Message::ReferencePicked);
            }
            Message::PickCandidates => {
                return Task::perform(pick_candidates(), Message::CandidatesPicked);
            }
            Message::ReferencePicked(Some(path)) => return load_reference(path),
            Message::ReferencePicked(None) => return Task::none(),
            Message::CandidatesPicked(paths) => return load_many(paths),
            Message::FileDropped(path) => {
                if self.drops.push(path) {
                    return Task::perform(tokio::time::sleep(DROP_SETTLE), |_| {
                        Message::DropSettled
                    });
                }
                return Task::none();
            }
            Message::DropHovered(target) => {
                self.drops.hover(target);
                return Task::none();
            }
            // Already flushed in `update`
            Message::DropSettled => return Task::none(),
            Message::ReferenceLoaded(path, Ok(image)) => {
                log::debug!("Reference decoded from {}", path.display());
                self.session.set_reference(image)
            }
            Message::ReferenceLoaded(path, Err(e)) => {
                self.session.reject(&loader::file_name(&path), &e)
            }
            Message::CandidatesLoaded(results) => self.ingest(results),
            Message::JobFinished(outcome) => self.session.complete(outcome),
            Message::Select(id) => self.session.select(id),
            Message::Delete(id) => self.session.remove(id),
            Message::SensitivityChanged(mode) => self.session.set_sensitivity(mode),
            Message::HighlightChanged(color) => self.session.set_highlight(color),
            Message::Pointer(input) => self.session.pointer(input),
            Message::LabelsExpired(ticket) => {
                self.session.labels_expired(ticket);
                Effects::default()
            }
            Message::StatusExpired(ticket) => {
                self.session.status_expired(ticket);
                Effects::default()
            }
        };

        self.refresh();
        self.schedule(effects)
    }

    /// Load the files of a finished drop
    fn flush_drops(&mut self) -> Task<Message> {
        match self.drops.flush() {
            Some(DropBatch::Reference(path)) => load_reference(path),
            Some(DropBatch::Candidates(paths)) => load_many(paths),
            None => Task::none(),
        }
    }

    /// Reject failed files, add the rest as one batch
    fn ingest(&mut self, results: Vec<(PathBuf, Loaded)>) -> Effects {
        let mut images = Vec::with_capacity(results.len());
        let mut rejected = Effects::default();

        for (path, result) in results {
            match result {
                Ok(image) => images.push(image),
                Err(e) => rejected = self.session.reject(&loader::file_name(&path), &e),
            }
        }

        if images.is_empty() {
            return rejected;
        }
        self.session.add_candidates(images)
    }

    /// Turn session effects into runtime tasks
    fn schedule(&self, effects: Effects) -> Task<Message> {
        let mut tasks: Vec<Task<Message>> = effects
            .jobs
            .into_iter()
            .map(|job| Task::perform(job.run(self.engine.clone()), Message::JobFinished))
            .collect();

        let settings = self.session.settings();
        if let Some(ticket) = effects.hide_labels {
            let delay = settings.label_hide_delay();
            tasks.push(Task::perform(tokio::time::sleep(delay), move |_| {
                Message::LabelsExpired(ticket)
            }));
        }
        if let Some(ticket) = effects.hide_status {
            let delay = settings.status_hide_delay();
            tasks.push(Task::perform(tokio::time::sleep(delay), move |_| {
                Message::StatusExpired(ticket)
            }));
        }

        Task::batch(tasks)
    }

    /// Rebuild the snapshot and the composed frame
    fn refresh(&mut self) {
        self.snapshot = self.session.snapshot();

        match &self.snapshot.current {
            Some(current) => {
                let frame = compose::compose(current);
                self.frame_size = frame.dimensions();
                self.frame = Some(Handle::from_rgba(
                    self.frame_size.0,
                    self.frame_size.1,
                    frame.into_raw(),
                ));
            }
            None => {
                self.frame = None;
                self.frame_size = (0, 0);
            }
        }
    }

    /// Build the user interface
    fn view(&self) -> Element<Message> {
        let snapshot = &self.snapshot;

        let area = column![
            ui::toolbar(snapshot),
            ui::comparison(snapshot, self.frame.as_ref(), self.frame_size),
            ui::status_bar(snapshot),
        ]
        .spacing(12);

        let content = row![
            ui::sidebar(
                snapshot,
                &self.session.settings().swatches,
                self.drops.hovered() == DropTarget::Reference,
            ),
            vertical_rule(1),
            area,
        ]
        .spacing(12)
        .padding(16);

        container(content)
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    }

    /// Window-wide events: button release anywhere ends a hold
    fn subscription(&self) -> Subscription<Message> {
        event::listen_with(|event, _status, _window| match event {
            Event::Mouse(mouse::Event::ButtonReleased(mouse::Button::Left)) => {
                Some(Message::Pointer(Input::Release))
            }
            Event::Window(window::Event::FileDropped(path)) => Some(Message::FileDropped(path)),
            _ => None,
        })
    }

    /// Set the application theme
    fn theme(&self) -> Theme {
        Theme::Dark
    }
}

fn main() -> iced::Result {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    iced::application("Compare View", CompareView::update, CompareView::view)
        .subscription(CompareView::subscription)
        .theme(CompareView::theme)
        .centered()
        .run_with(CompareView::new)
}

async fn pick_reference() -> Option<PathBuf> {
    AsyncFileDialog::new()
        .set_title("Select Reference Image")
        .add_filter("Images", IMAGE_EXTENSIONS)
        .pick_file()
        .await
        .map(|handle| handle.path().to_path_buf())
}

async fn pick_candidates() -> Vec<PathBuf> {
    AsyncFileDialog::new()
        .set_title("Select Candidate Images")
        .add_filter("Images", IMAGE_EXTENSIONS)
        .pick_files()
        .await
        .unwrap_or_default()
        .into_iter()
        .map(|handle| handle.path().to_path_buf())
        .collect()
}

fn load_reference(path: PathBuf) -> Task<Message> {
    Task::perform(
        loader::load_image(path.clone()),
        move |loaded| Message::ReferenceLoaded(path.clone(), loaded.map_err(Arc::new)),
    )
}

fn load_many(paths: Vec<PathBuf>) -> Task<Message> {
    if paths.is_empty() {
        return Task::none();
    }

    Task::perform(
        async move {
            loader::load_images(paths)
                .await
                .into_iter()
                .map(|(path, result)| (path, result.map_err(Arc::new)))
                .collect()
        },
        Message::CandidatesLoaded,
    )
}
