/// Comparison area overlay
/// Draws the edge labels over the composed frame and turns pointer
/// movement into wipe positions
use iced::alignment;
use iced::mouse::{self, Cursor};
use iced::widget::canvas::{self, Program};
use iced::{Color, Point, Rectangle, Renderer, Size, Theme};

use compare_view::state::labels::Labels;
use compare_view::state::Input;

use crate::Message;

const LABEL_MARGIN: f32 = 10.0;
const LABEL_SIZE: f32 = 14.0;

/// Overlay canvas stacked on top of the frame image
#[derive(Debug, Clone)]
pub struct Overlay {
    pub labels: Labels,
    /// Frame size in pixels, used to locate the image inside the widget
    pub image_size: (u32, u32),
}

impl Overlay {
    /// Where the image lands when fitted (contained, centered) in `bounds`
    fn image_rect(&self, bounds: Size) -> Rectangle {
        let (width, height) = (self.image_size.0 as f32, self.image_size.1 as f32);
        if width <= 0.0 || height <= 0.0 {
            return Rectangle::new(Point::ORIGIN, bounds);
        }

        let scale = (bounds.width / width).min(bounds.height / height);
        let fitted = Size::new(width * scale, height * scale);
        Rectangle::new(
            Point::new(
                (bounds.width - fitted.width) / 2.0,
                (bounds.height - fitted.height) / 2.0,
            ),
            fitted,
        )
    }
}

impl Program<Message> for Overlay {
    type State = ();

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: Cursor,
    ) -> Vec<canvas::Geometry> {
        let mut frame = canvas::Frame::new(renderer, bounds.size());

        if !self.labels.visible {
            return vec![frame.into_geometry()];
        }

        let rect = self.image_rect(bounds.size());
        let top = rect.y + LABEL_MARGIN;

        let label = |content: &str, x: f32, align: alignment::Horizontal| canvas::Text {
            content: content.to_string(),
            position: Point::new(x, top),
            color: Color::WHITE,
            size: LABEL_SIZE.into(),
            horizontal_alignment: align,
            ..canvas::Text::default()
        };

        if !self.labels.left.is_empty() {
            frame.fill_text(label(
                &self.labels.left,
                rect.x + LABEL_MARGIN,
                alignment::Horizontal::Left,
            ));
        }
        if !self.labels.right.is_empty() {
            frame.fill_text(label(
                &self.labels.right,
                rect.x + rect.width - LABEL_MARGIN,
                alignment::Horizontal::Right,
            ));
        }

        vec![frame.into_geometry()]
    }

    fn update(
        &self,
        _state: &mut Self::State,
        event: canvas::Event,
        bounds: Rectangle,
        cursor: Cursor,
    ) -> (canvas::event::Status, Option<Message>) {
        // Pointer position as a share of the image width
        if let canvas::Event::Mouse(mouse::Event::CursorMoved { .. }) = event {
            if let Some(position) = cursor.position_in(bounds) {
                let rect = self.image_rect(bounds.size());
                if rect.width > 0.0 {
                    let percent = (position.x - rect.x) / rect.width * 100.0;
                    return (
                        canvas::event::Status::Captured,
                        Some(Message::Pointer(Input::Move { percent })),
                    );
                }
            }
        }

        (canvas::event::Status::Ignored, None)
    }
}
