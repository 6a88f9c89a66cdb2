//! Report export - tournament details, standings and rounds as files
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: export_tournament() - orchestration
//! - Level 2: report_tables()
//! - Level 3: write_csv(), write_html()
//! - Level 4: formatting utilities
//!
//! One export is a timestamped directory holding three tables:
//! `tournament_info`, `tournament_players` and `tournament_rounds_matches`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use clap::ValueEnum;

use chessclub_core::{slug, Score, Tournament};
use chessclub_tournament::compute_standings;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    #[default]
    Csv,
    Html,
}

impl ExportFormat {
    fn extension(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Html => "html",
        }
    }
}

/// One exported file
struct Table {
    name: &'static str,
    headers: &'static [&'static str],
    rows: Vec<Vec<String>>,
}

// ============================================================================
// LEVEL 1: ORCHESTRATION
// ============================================================================

/// Write every report table of `tournament` under `out_dir`; returns the
/// directory created for this export
pub fn export_tournament(
    tournament: &Tournament,
    format: ExportFormat,
    out_dir: &Path,
) -> Result<PathBuf> {
    let stamp = Local::now().format("%Y%m%d_%H%M%S");
    let dir = out_dir.join(format!("{}_{stamp}", slug(&tournament.name)));
    fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create export directory: {}", dir.display()))?;

    for table in report_tables(tournament) {
        let path = dir.join(format!("{}.{}", table.name, format.extension()));
        match format {
            ExportFormat::Csv => write_csv(&path, &table)?,
            ExportFormat::Html => write_html(&path, &tournament.name, &table)?,
        }
        tracing::debug!("Wrote {} rows to {}", table.rows.len(), path.display());
    }

    tracing::info!("Exported '{}' to {}", tournament.name, dir.display());
    Ok(dir)
}

// ============================================================================
// LEVEL 2: REPORT TABLES
// ============================================================================

fn report_tables(t: &Tournament) -> Vec<Table> {
    let info = Table {
        name: "tournament_info",
        headers: &[
            "name",
            "location",
            "start_date",
            "end_date",
            "description",
            "rounds_total",
            "rounds_played",
            "status",
        ],
        rows: vec![vec![
            t.name.clone(),
            t.location.clone(),
            t.start_date.format("%d/%m/%Y").to_string(),
            t.end_date.format("%d/%m/%Y").to_string(),
            t.description.clone(),
            t.rounds_total.to_string(),
            t.rounds.len().to_string(),
            t.status().to_string(),
        ]],
    };

    let players = Table {
        name: "tournament_players",
        headers: &[
            "rank",
            "id_national",
            "last_name",
            "first_name",
            "birth_date",
            "score",
            "wins",
            "draws",
            "losses",
        ],
        rows: compute_standings(t)
            .into_iter()
            .map(|s| {
                vec![
                    s.rank.to_string(),
                    s.player.id.to_string(),
                    s.player.last_name,
                    s.player.first_name,
                    s.player.birth_date.format("%d/%m/%Y").to_string(),
                    s.score.to_string(),
                    s.wins.to_string(),
                    s.draws.to_string(),
                    s.losses.to_string(),
                ]
            })
            .collect(),
    };

    let mut match_rows = Vec::new();
    for (r, round) in t.rounds.iter().enumerate() {
        let start = round.start_time.to_rfc3339();
        let end = round.end_time.map(|e| e.to_rfc3339()).unwrap_or_default();
        for (m, game) in round.matches.iter().enumerate() {
            match_rows.push(vec![
                (r + 1).to_string(),
                round.name.clone(),
                start.clone(),
                end.clone(),
                (m + 1).to_string(),
                game.player1.to_string(),
                game.player2.to_string(),
                score_cell(game.score1),
                score_cell(game.score2),
            ]);
        }
    }
    let rounds = Table {
        name: "tournament_rounds_matches",
        headers: &[
            "round_index",
            "round_name",
            "round_start",
            "round_end",
            "match_index",
            "player1_id",
            "player2_id",
            "score1",
            "score2",
        ],
        rows: match_rows,
    };

    vec![info, players, rounds]
}

// ============================================================================
// LEVEL 3: WRITERS
// ============================================================================

fn write_csv(path: &Path, table: &Table) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create CSV file: {}", path.display()))?;
    writer.write_record(table.headers)?;
    for row in &table.rows {
        writer.write_record(row)?;
    }
    writer.flush()?;
    Ok(())
}

fn write_html(path: &Path, title: &str, table: &Table) -> Result<()> {
    let mut html = String::new();
    html.push_str("<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\">");
    html.push_str(&format!("<title>{}</title></head>\n<body>\n", escape_html(title)));
    html.push_str("<table border=\"1\">\n<tr>");
    for header in table.headers {
        html.push_str(&format!("<th>{}</th>", escape_html(header)));
    }
    html.push_str("</tr>\n");
    for row in &table.rows {
        html.push_str("<tr>");
        for cell in row {
            html.push_str(&format!("<td>{}</td>", escape_html(cell)));
        }
        html.push_str("</tr>\n");
    }
    html.push_str("</table>\n</body>\n</html>\n");

    fs::write(path, html)
        .with_context(|| format!("Failed to write HTML file: {}", path.display()))
}

// ============================================================================
// LEVEL 4: FORMATTING
// ============================================================================

fn score_cell(score: Option<Score>) -> String {
    score.map(|s| s.to_string()).unwrap_or_default()
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chessclub_core::{Match, Player, PlayerId, Round};
    use chrono::Utc;
    use tempfile::TempDir;

    fn pid(raw: &str) -> PlayerId {
        PlayerId::parse(raw).unwrap()
    }

    fn played_tournament() -> Tournament {
        let mut t =
            Tournament::new("Rook & Pawn Open", "Lyon", "01/04/2025", "02/04/2025", "", 3).unwrap();
        let roster = [
            ("EX00001", "Alpha"),
            ("EX00002", "Bravo"),
            ("EX00003", "Charlie"),
            ("EX00004", "Delta"),
        ];
        for (id, last) in roster {
            t.register(Player::new(id, last, "Kim", "01/01/1990").unwrap())
                .unwrap();
        }

        let matches = vec![
            Match::new(pid("EX00001"), pid("EX00002")).unwrap(),
            Match::new(pid("EX00003"), pid("EX00004")).unwrap(),
        ];
        let mut round = Round::new(1, matches, Utc::now());
        round.enter_score(0, 0.0, 1.0).unwrap();
        round.enter_score(1, 0.5, 0.5).unwrap();
        round.close(Utc::now()).unwrap();
        t.rounds.push(round);
        t
    }

    #[test]
    fn test_csv_export_writes_three_tables() {
        let temp_dir = TempDir::new().unwrap();
        let t = played_tournament();

        let dir = export_tournament(&t, ExportFormat::Csv, temp_dir.path()).unwrap();
        assert!(dir
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("rook_pawn_open_"));

        let mut players = csv::Reader::from_path(dir.join("tournament_players.csv")).unwrap();
        let headers = players.headers().unwrap().clone();
        assert_eq!(&headers[0], "rank");
        assert_eq!(&headers[5], "score");
        let rows: Vec<csv::StringRecord> = players.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 4);
        assert_eq!(&rows[0][1], "EX00002");
        assert_eq!(&rows[0][5], "1");
        assert_eq!(&rows[1][5], "0.5");

        let mut rounds =
            csv::Reader::from_path(dir.join("tournament_rounds_matches.csv")).unwrap();
        let rows: Vec<csv::StringRecord> = rounds.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[1][1], "Round 1");
        assert_eq!(&rows[1][7], "0.5");
        assert!(!rows[1][3].is_empty());

        let mut info = csv::Reader::from_path(dir.join("tournament_info.csv")).unwrap();
        let row = info.records().next().unwrap().unwrap();
        assert_eq!(&row[0], "Rook & Pawn Open");
        assert_eq!(&row[6], "1");
    }

    #[test]
    fn test_html_export_escapes_cells() {
        let temp_dir = TempDir::new().unwrap();
        let t = played_tournament();

        let dir = export_tournament(&t, ExportFormat::Html, temp_dir.path()).unwrap();
        let html = fs::read_to_string(dir.join("tournament_info.html")).unwrap();
        assert!(html.contains("<th>rounds_played</th>"));
        assert!(html.contains("<td>Rook &amp; Pawn Open</td>"));
        assert!(dir.join("tournament_players.html").exists());
        assert!(dir.join("tournament_rounds_matches.html").exists());
    }

    #[test]
    fn test_unstarted_export_has_no_match_rows() {
        let temp_dir = TempDir::new().unwrap();
        let t = Tournament::new("Empty", "Lyon", "01/04/2025", "01/04/2025", "", 4).unwrap();

        let dir = export_tournament(&t, ExportFormat::Csv, temp_dir.path()).unwrap();
        let mut rounds =
            csv::Reader::from_path(dir.join("tournament_rounds_matches.csv")).unwrap();
        assert_eq!(rounds.records().count(), 0);
        assert_eq!(&rounds.headers().unwrap()[0], "round_index");
    }
}
