//! Interactive quiz loop over any line-based reader and writer.

use std::io::{BufRead, Write};

use anyhow::Result;
use rand::Rng;
use tracing::debug;

use grad_core::session::format_value;
use grad_core::{
    CheckOutcome, Feedback, GradError, QuestionSession, QuestionView, SessionState, SessionStats,
};

const NEXT_PROMPT: &str = "Press enter or type skip for the next question, quit to stop: ";

enum Reply {
    Line(String),
    Quit,
}

fn prompt<I: BufRead, O: Write>(input: &mut I, out: &mut O, label: &str) -> Result<Reply> {
    write!(out, "{label}")?;
    out.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        writeln!(out)?;
        return Ok(Reply::Quit);
    }
    let line = line.trim();
    if line.eq_ignore_ascii_case("quit") || line.eq_ignore_ascii_case("q") {
        return Ok(Reply::Quit);
    }
    Ok(Reply::Line(line.to_string()))
}

fn print_question<O: Write>(out: &mut O, number: usize, q: &QuestionView) -> Result<()> {
    writeln!(out)?;
    writeln!(out, "Question {number} ({})", q.family)?;
    writeln!(out, "  f(x, y) = {}", q.formula)?;
    writeln!(
        out,
        "  Find the gradient at ({}, {}).",
        format_value(q.point.x),
        format_value(q.point.y)
    )?;
    Ok(())
}

fn verdict_line(label: &str, outcome: &CheckOutcome, expected: f64) -> String {
    let expected = format_value(expected);
    match (&outcome.diagnostic, outcome.user_value) {
        (Some(diag), _) => {
            format!("{label}: incorrect, could not evaluate ({diag}); expected {expected}")
        }
        (None, Some(v)) if outcome.matches => {
            format!("{label}: correct ({})", format_value(v))
        }
        (None, Some(v)) => format!(
            "{label}: incorrect, you gave {} but expected {expected}",
            format_value(v)
        ),
        (None, None) => format!("{label}: incorrect; expected {expected}"),
    }
}

fn print_feedback<O: Write>(out: &mut O, feedback: &Feedback) -> Result<()> {
    writeln!(out)?;
    writeln!(
        out,
        "{}",
        verdict_line("df/dx", &feedback.dfdx_verdict, feedback.correct_dfdx)
    )?;
    writeln!(
        out,
        "{}",
        verdict_line("df/dy", &feedback.dfdy_verdict, feedback.correct_dfdy)
    )?;
    writeln!(
        out,
        "{}",
        if feedback.correct {
            "Well done!"
        } else {
            "Not quite. Here is the solution:"
        }
    )?;
    for step in &feedback.solution_steps {
        writeln!(out, "  {step}")?;
    }
    writeln!(out, "Score: {}", score_line(&feedback.updated_stats))?;
    Ok(())
}

pub fn score_line(stats: &SessionStats) -> String {
    match stats.accuracy() {
        Some(acc) => format!(
            "{}/{} ({:.0}%)",
            stats.correct,
            stats.attempted,
            acc * 100.0
        ),
        None => "0/0".into(),
    }
}

/// Run questions until `rounds` have been graded, the user types `quit`, or
/// input ends. Any other reply after feedback (blank or `skip`) moves on.
/// Returns the final stats.
pub fn run_quiz<R: Rng, I: BufRead, O: Write>(
    session: &mut QuestionSession<R>,
    input: &mut I,
    out: &mut O,
    rounds: Option<usize>,
) -> Result<SessionStats> {
    let mut number = 0;

    'questions: loop {
        if rounds.is_some_and(|r| number >= r) {
            break;
        }

        let posed = match session.state() {
            SessionState::Graded => session.skip()?,
            _ => session.new_question()?,
        };
        number += 1;
        print_question(out, number, &posed.question)?;

        let feedback = loop {
            let dfdx = match prompt(input, out, "df/dx = ")? {
                Reply::Line(l) => l,
                Reply::Quit => break 'questions,
            };
            let dfdy = match prompt(input, out, "df/dy = ")? {
                Reply::Line(l) => l,
                Reply::Quit => break 'questions,
            };
            match session.submit(&dfdx, &dfdy) {
                Ok(feedback) => break feedback,
                Err(GradError::Validation(msg)) => {
                    debug!("submission rejected: {msg}");
                    writeln!(out, "{msg}")?;
                }
                Err(e) => return Err(e.into()),
            }
        };
        print_feedback(out, &feedback)?;

        if rounds.is_some_and(|r| number >= r) {
            break;
        }
        let next = prompt(input, out, NEXT_PROMPT)?;
        if let Reply::Quit = next {
            break;
        }
    }

    let stats = session.stats();
    writeln!(out)?;
    writeln!(out, "Session over. Final score: {}", score_line(&stats))?;
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use grad_core::{Catalog, CoefficientRule, FamilyId, FunctionFamily, SessionConfig};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::io::Cursor;

    /// Every question is the saddle 2x^2 - y^2; only the point varies.
    fn saddle_session() -> QuestionSession<StdRng> {
        let catalog = Catalog::new(vec![FunctionFamily::new(
            FamilyId::Saddle,
            "Saddle",
            vec![CoefficientRule::new("a", 2, 2), CoefficientRule::new("b", 1, 1)],
        )])
        .unwrap();
        QuestionSession::with_catalog(StdRng::seed_from_u64(9), catalog, SessionConfig::default())
            .unwrap()
    }

    fn run(
        session: &mut QuestionSession<StdRng>,
        script: &str,
        rounds: Option<usize>,
    ) -> (SessionStats, String) {
        let mut input = Cursor::new(script.as_bytes().to_vec());
        let mut out = Vec::new();
        let stats = run_quiz(session, &mut input, &mut out, rounds).unwrap();
        (stats, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_symbolic_answer_is_graded_correct() {
        let mut session = saddle_session();
        let (stats, out) = run(&mut session, "4*x\n-2*y\n", Some(1));
        assert_eq!(stats, SessionStats { attempted: 1, correct: 1 });
        assert!(out.contains("f(x, y) = 2*x^2 - 1*y^2"));
        assert!(out.contains("Well done!"));
        assert!(out.contains("Final score: 1/1 (100%)"));
    }

    #[test]
    fn test_wrong_answer_shows_solution() {
        let mut session = saddle_session();
        let (stats, out) = run(&mut session, "x+100\ny+100\n", Some(1));
        assert_eq!(stats.correct, 0);
        assert!(out.contains("Not quite"));
        assert!(out.contains("∂f/∂x = 4*x"));
    }

    #[test]
    fn test_empty_answer_is_reprompted() {
        let mut session = saddle_session();
        let (stats, out) = run(&mut session, "\n-2*y\n4*x\n-2*y\n", Some(1));
        assert_eq!(stats, SessionStats { attempted: 1, correct: 1 });
        assert!(out.contains("enter both partial derivatives"));
    }

    #[test]
    fn test_parse_error_is_reported() {
        let mut session = saddle_session();
        let (stats, out) = run(&mut session, "4*(x\n-2*y\n", Some(1));
        assert_eq!(stats.attempted, 1);
        assert!(out.contains("could not evaluate (parse error"));
    }

    #[test]
    fn test_multiple_rounds_then_quit() {
        let mut session = saddle_session();
        let (stats, out) = run(&mut session, "4*x\n-2*y\n\nx+100\ny+100\nquit\n", None);
        assert_eq!(stats, SessionStats { attempted: 2, correct: 1 });
        assert!(out.contains("Question 2"));
        assert!(!out.contains("Question 3"));
    }

    #[test]
    fn test_eof_ends_session() {
        let mut session = saddle_session();
        let (stats, out) = run(&mut session, "", None);
        assert_eq!(stats.attempted, 0);
        assert!(out.contains("Final score: 0/0"));
    }
}
