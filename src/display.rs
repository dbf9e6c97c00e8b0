use anyhow::Result;
use crossterm::{
    style::{style, Attribute, Color, PrintStyledContent},
    QueueableCommand,
};

use std::io::{stdout, Write};

use hidden_connect4::{GameState, Player, Visibility, HEIGHT, WIDTH};

/// Draws `state` to stdout, dimming the cells `visibility` leaves hidden
pub fn display(state: &GameState, visibility: &Visibility) -> Result<()> {
    let mut stdout = stdout();

    let cols: String = (0..WIDTH).map(|x| x.to_string()).collect();
    stdout.queue(PrintStyledContent(style(cols + "\n")))?;

    for row in (0..HEIGHT).rev() {
        for column in 0..WIDTH {
            let tile = style("O")
                .attribute(if visibility.is_visible(row, column) {
                    Attribute::Bold
                } else {
                    Attribute::Dim
                })
                .on(Color::DarkBlue)
                .with(match state.content(row, column) {
                    Some(Player::Engine) => Color::Red,
                    Some(Player::Opponent) => Color::Yellow,
                    None => Color::DarkBlue,
                });
            stdout.queue(PrintStyledContent(tile))?;
        }
        stdout.queue(PrintStyledContent(style("\n")))?;
    }
    stdout.flush()?;
    Ok(())
}
