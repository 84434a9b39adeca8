use crate::app::Status;
use nav_nexus::{Screen, platform::WindowSnapshot};
use ratatui::layout::{Alignment, Constraint, Direction, Layout};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, List, ListItem, Paragraph};

pub fn render(frame: &mut ratatui::Frame, snapshot: &WindowSnapshot, status: &Status) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Route
            Constraint::Min(0),    // Window + log
            Constraint::Length(3), // Keys
        ])
        .split(frame.area());

    let header = Paragraph::new(Line::from(vec![
        Span::styled("requested ", Style::default().fg(Color::DarkGray)),
        Span::styled(status.requested.to_string(), Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
    ]))
    .block(Block::default().borders(Borders::ALL).border_type(BorderType::Rounded).title(" nav-demo "));
    frame.render_widget(header, chunks[0]);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[1]);

    frame.render_widget(window_list(snapshot), body[0]);

    let log: Vec<ListItem> = status
        .log
        .iter()
        .rev()
        .map(|l| ListItem::new(l.as_str()))
        .collect();
    let log = List::new(log).block(Block::default().borders(Borders::ALL).title(" Transitions "));
    frame.render_widget(log, body[1]);

    let keys = Paragraph::new("l login  o oauth  m main  b bookmark  d detail  s signup  esc back  q quit")
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::DarkGray))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(keys, chunks[2]);
}

/// One line per layer, bottom first; the front layer is highlighted.
fn window_list(snapshot: &WindowSnapshot) -> List<'static> {
    let front = snapshot.front().cloned();
    let mut layers: Vec<(String, &Screen)> = Vec::new();
    if let Some(root) = &snapshot.root {
        layers.push(("window".to_string(), root));
    }
    for (i, screen) in snapshot.stack.iter().enumerate() {
        layers.push((format!("stack[{i}]"), screen));
    }
    if let Some(modal) = &snapshot.modal {
        layers.push(("modal".to_string(), modal));
    }

    let items: Vec<ListItem> = layers
        .into_iter()
        .map(|(label, screen)| {
            let style = if Some(screen) == front.as_ref() {
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            ListItem::new(Line::from(vec![
                Span::styled(format!("{label:>9}  "), Style::default().fg(Color::DarkGray)),
                Span::styled(screen.to_string(), style),
            ]))
        })
        .collect();

    List::new(items).block(Block::default().borders(Borders::ALL).title(" Window "))
}
