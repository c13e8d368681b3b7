use himmle_common::User;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Style, Stylize},
    text::{Line, Span},
    widgets::{Paragraph, Widget, Wrap},
};

pub struct ProfileCard<'a> {
    user: &'a User,
}

impl<'a> ProfileCard<'a> {
    pub fn new(user: &'a User) -> Self {
        Self { user }
    }
}

impl Widget for ProfileCard<'_> {
    fn render(self, area: Rect, buffer: &mut Buffer) {
        Paragraph::new(profile_lines(self.user))
            .wrap(Wrap { trim: true })
            .render(area, buffer);
    }
}

/// Profile sections; absent fields are left out, as are sections with nothing to show.
pub fn profile_lines(user: &User) -> Vec<Line<'static>> {
    let mut lines = vec![
        Line::from(user.display_name.to_string()).bold(),
        Line::from(format!("@{}", user.username)).dim(),
        Line::default(),
        section("INFO"),
    ];
    if let Some(date_of_birth) = &user.date_of_birth {
        lines.push(field("Date of birth", date_of_birth));
    }
    lines.push(field(
        "Status",
        if user.is_online { "Online" } else { "Offline" },
    ));

    let more = [
        ("Location", &user.location),
        ("Profession", &user.profession),
        ("Hobby", &user.hobby),
    ];
    if more.iter().any(|(_, value)| value.is_some()) {
        lines.push(Line::default());
        lines.push(section("MORE INFO"));
        for (label, value) in more {
            if let Some(value) = value {
                lines.push(field(label, value));
            }
        }
    }

    if let Some(bio) = &user.bio {
        lines.push(Line::default());
        lines.push(section("BIO"));
        lines.push(Line::from(bio.to_string()));
    }
    lines
}

fn section(title: &'static str) -> Line<'static> {
    Line::from(title).dim().bold()
}

fn field(label: &'static str, value: &str) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{label}: "), Style::new().dim()),
        Span::raw(value.to_owned()),
    ])
}
