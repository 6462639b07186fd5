//! Game of 24: combine four numbers with `+ - * /` to reach exactly 24.
//!
//! A thought is a sequence of lines `a op b = c (left: ...)`, one per step, followed by a
//! final `Answer: <expression> = 24` line at the last step.

use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::SolveError;
use crate::task::expr::evaluate;
use crate::task::{Task, TestOutcome};

static NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").expect("valid regex"));

const STANDARD_PROMPT: &str = "Use numbers and basic arithmetic operations (+ - * /) to obtain 24.
Input: 4 4 6 8
Answer: (4 + 8) * (6 - 4) = 24
Input: 2 9 10 12
Answer: 2 * 12 * (10 - 9) = 24
Input: 1 4 8 8
Answer: (8 / 4 + 1) * 8 = 24
Input: {input}
";

const COT_PROMPT: &str = "Use numbers and basic arithmetic operations (+ - * /) to obtain 24. \
Each step, you are only allowed to choose two of the remaining numbers to obtain a new number.
Input: 4 4 6 8
Steps:
4 + 8 = 12 (left: 4 6 12)
6 - 4 = 2 (left: 2 12)
2 * 12 = 24 (left: 24)
Answer: (6 - 4) * (4 + 8) = 24
Input: 2 9 10 12
Steps:
12 * 2 = 24 (left: 9 10 24)
10 - 9 = 1 (left: 1 24)
24 * 1 = 24 (left: 24)
Answer: (12 * 2) * (10 - 9) = 24
Input: {input}
";

const PROPOSE_PROMPT: &str = "Input: 2 8 8 14
Possible next steps:
2 + 8 = 10 (left: 8 10 14)
8 / 2 = 4 (left: 4 8 14)
14 + 2 = 16 (left: 8 8 16)
2 * 8 = 16 (left: 8 14 16)
8 - 2 = 6 (left: 6 8 14)
14 - 8 = 6 (left: 2 6 8)
14 / 2 = 7 (left: 7 8 8)
14 - 2 = 12 (left: 8 8 12)
Input: {input}
Possible next steps:
";

const VALUE_PROMPT: &str = "Evaluate if given numbers can reach 24 (sure/likely/impossible)
10 14
10 + 14 = 24
sure
4 4 10
(10 - 4) * 4 = 24
sure
1 3 3
1 * 3 * 3 = 9
(1 + 3) * 3 = 12
1 3 3 are all too small
impossible
10 10 11
10 + 10 + 11 = 31
(11 - 10) * 10 = 10
10 10 10 are all too big
impossible
{input}
";

const VALUE_LAST_STEP_PROMPT: &str = "Use numbers and basic arithmetic operations (+ - * /) to obtain 24. \
Given an input and an answer, judge whether the answer is correct, i.e. it uses each input \
number exactly once and no other numbers, and reaches 24.
Input: 4 4 6 8
Answer: (4 + 8) * (6 - 4) = 24
Judge:
sure
Input: 4 9 10 13
Answer: (10 - 4) * (13 - 9) = 24
Judge:
sure
Input: 2 9 10 12
Answer: 2 * (12 - 10) = 24
Judge:
impossible
Input: {input}
Answer: {answer}
Judge:";

/// Game of 24 puzzles, e.g. `"4 5 6 10"`.
pub struct Game24Task {
    puzzles: Vec<String>,
}

impl Game24Task {
    pub fn from_puzzles<I, S>(puzzles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            puzzles: puzzles.into_iter().map(Into::into).collect(),
        }
    }

    /// Loads puzzles from the 4nums CSV: header row, puzzle in the `Puzzles` column.
    pub fn from_csv(path: &Path) -> Result<Self, SolveError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| SolveError::Task(format!("read {}: {}", path.display(), e)))?;
        Self::parse_csv(&content)
    }

    fn parse_csv(content: &str) -> Result<Self, SolveError> {
        let mut lines = content.lines();
        let header = lines
            .next()
            .ok_or_else(|| SolveError::Task("empty puzzle file".into()))?;
        let column = header
            .split(',')
            .position(|h| h.trim().eq_ignore_ascii_case("puzzles"))
            .ok_or_else(|| SolveError::Task("puzzle file has no 'Puzzles' column".into()))?;
        let puzzles = lines
            .filter(|l| !l.trim().is_empty())
            .filter_map(|l| l.split(',').nth(column).map(|p| p.trim().to_string()))
            .collect();
        Ok(Self { puzzles })
    }

    /// Numbers still available after the last step of `y`, e.g. `"4 8 14"`.
    fn current_numbers(y: &str) -> String {
        let last_line = y.trim().lines().last().unwrap_or("");
        let after = last_line.rsplit("left: ").next().unwrap_or(last_line);
        after.split(')').next().unwrap_or(after).trim().to_string()
    }

    fn sorted_numbers(s: &str) -> Vec<u64> {
        let mut v: Vec<u64> = NUMBER
            .find_iter(s)
            .filter_map(|m| m.as_str().parse().ok())
            .collect();
        v.sort_unstable();
        v
    }
}

impl Task for Game24Task {
    fn name(&self) -> &str {
        "game24"
    }

    fn len(&self) -> usize {
        self.puzzles.len()
    }

    fn input(&self, idx: usize) -> Result<String, SolveError> {
        self.puzzles.get(idx).cloned().ok_or_else(|| {
            SolveError::Task(format!(
                "game24 index {} out of range ({} puzzles)",
                idx,
                self.puzzles.len()
            ))
        })
    }

    fn steps(&self) -> usize {
        4
    }

    fn stop(&self, _step: usize) -> Option<&str> {
        Some("\n")
    }

    fn is_terminal(&self, state: &str) -> bool {
        state
            .trim()
            .lines()
            .last()
            .map(|l| l.to_lowercase().starts_with("answer"))
            .unwrap_or(false)
    }

    fn standard_prompt_wrap(&self, x: &str, y: &str) -> String {
        format!("{}{}", STANDARD_PROMPT.replace("{input}", x), y)
    }

    fn cot_prompt_wrap(&self, x: &str, y: &str) -> String {
        format!("{}{}", COT_PROMPT.replace("{input}", x), y)
    }

    fn propose_prompt_wrap(&self, x: &str, y: &str) -> String {
        let current = if y.is_empty() {
            x.to_string()
        } else {
            Self::current_numbers(y)
        };
        if current == "24" {
            format!("{}Steps:\n{}", COT_PROMPT.replace("{input}", x), y)
        } else {
            PROPOSE_PROMPT.replace("{input}", &current)
        }
    }

    fn value_prompt_wrap(&self, x: &str, y: &str) -> String {
        let last_line = y.trim().lines().last().unwrap_or("");
        if !last_line.contains("left: ") {
            let answer = last_line.to_lowercase().replace("answer: ", "");
            return VALUE_LAST_STEP_PROMPT
                .replace("{input}", x)
                .replace("{answer}", &answer);
        }
        VALUE_PROMPT.replace("{input}", &Self::current_numbers(y))
    }

    fn value_outputs_unwrap(&self, _x: &str, y: &str, outputs: &[String]) -> f64 {
        if y.trim().lines().count() == 4 && !y.to_lowercase().contains("answer") {
            return 0.0;
        }
        if outputs.is_empty() {
            return 0.0;
        }
        let total: f64 = outputs
            .iter()
            .map(|o| {
                let verdict = o.trim().lines().last().unwrap_or("").trim().to_lowercase();
                match verdict.as_str() {
                    "sure" => 20.0,
                    "likely" => 1.0,
                    "impossible" => 0.001,
                    _ => 0.0,
                }
            })
            .sum();
        total / outputs.len() as f64
    }

    fn test_output(&self, idx: usize, output: &str) -> TestOutcome {
        let Some(puzzle) = self.puzzles.get(idx) else {
            return TestOutcome::fail(format!("no puzzle at index {}", idx));
        };
        let last_line = output.trim().lines().last().unwrap_or("").to_lowercase();
        let answer = last_line.replace("answer: ", "");
        let expression = answer.split('=').next().unwrap_or("").trim();
        if expression.is_empty() {
            return TestOutcome::fail("no expression");
        }
        if Self::sorted_numbers(expression) != Self::sorted_numbers(puzzle) {
            return TestOutcome::fail("numbers do not match the puzzle");
        }
        match evaluate(expression) {
            Ok(v) if v.is_integer(24) => TestOutcome::pass(),
            Ok(v) => TestOutcome::fail(format!("evaluates to {}", v)),
            Err(e) => TestOutcome::fail(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task() -> Game24Task {
        Game24Task::from_puzzles(["4 5 6 10", "1 1 4 6"])
    }

    /// **Scenario**: CSV loader finds the Puzzles column regardless of position.
    #[test]
    fn parse_csv_reads_puzzles_column() {
        let csv = "Rank,Puzzles,AMT (s),Solved rate\n1,1 1 4 6,4.4,99.6%\n2,1 1 11 11,4.4,99.6%\n";
        let t = Game24Task::parse_csv(csv).unwrap();
        assert_eq!(t.len(), 2);
        assert_eq!(t.input(1).unwrap(), "1 1 11 11");
        assert!(Game24Task::parse_csv("Rank,Other\n1,2\n").is_err());
        assert!(Game24Task::parse_csv("").is_err());
    }

    /// **Scenario**: out-of-range index is a task error, not a panic.
    #[test]
    fn input_out_of_range_is_error() {
        assert!(matches!(task().input(9), Err(SolveError::Task(_))));
    }

    #[test]
    fn current_numbers_reads_last_step() {
        let y = "4 + 6 = 10 (left: 5 10 10)\n10 - 5 = 5 (left: 5 10)\n";
        assert_eq!(Game24Task::current_numbers(y), "5 10");
    }

    /// **Scenario**: propose prompt uses x at the root and remaining numbers afterwards.
    #[test]
    fn propose_prompt_tracks_remaining_numbers() {
        let t = task();
        assert!(t
            .propose_prompt_wrap("4 5 6 10", "")
            .ends_with("Input: 4 5 6 10\nPossible next steps:\n"));
        let p = t.propose_prompt_wrap("4 5 6 10", "4 + 6 = 10 (left: 5 10 10)\n");
        assert!(p.contains("Input: 5 10 10\nPossible next steps:"));
        let done = "5 * 6 = 30 (left: 4 10 30)\n10 - 4 = 6 (left: 6 30)\n30 - 6 = 24 (left: 24)\n";
        let p = t.propose_prompt_wrap("4 5 6 10", done);
        assert!(p.ends_with(&format!("Steps:\n{}", done)));
    }

    /// **Scenario**: value prompt switches to answer judging once the last line is an answer.
    #[test]
    fn value_prompt_switches_on_answer_line() {
        let t = task();
        let p = t.value_prompt_wrap("4 5 6 10", "4 + 6 = 10 (left: 5 10 10)\n");
        assert!(p.ends_with("5 10 10\n"));
        let p = t.value_prompt_wrap("4 5 6 10", "...\nAnswer: (5 * 6) - (10 - 4) = 24");
        assert!(p.contains("Input: 4 5 6 10\nAnswer: (5 * 6) - (10 - 4) = 24\nJudge:"));
    }

    /// **Scenario**: verdicts are mapped and averaged; a 4-line path without answer is 0.
    #[test]
    fn value_outputs_unwrap_maps_and_averages() {
        let t = task();
        let outs = vec!["...\nsure".to_string(), "likely".to_string()];
        assert_eq!(t.value_outputs_unwrap("x", "a (left: 1 2)\n", &outs), 10.5);
        let four = "a (left: 1)\nb (left: 1)\nc (left: 1)\nd (left: 1)\n";
        assert_eq!(t.value_outputs_unwrap("x", four, &outs), 0.0);
        assert_eq!(t.value_outputs_unwrap("x", "a (left: 1 2)", &[]), 0.0);
    }

    #[test]
    fn test_output_accepts_correct_answer() {
        let out = "5 * 6 = 30 (left: 4 10 30)\nAnswer: (5 * 6) - (10 - 4) = 24";
        assert_eq!(task().test_output(0, out), TestOutcome::pass());
    }

    #[test]
    fn test_output_rejects_wrong_numbers_and_values() {
        let t = task();
        assert_eq!(t.test_output(0, "Answer: 4 * 6 = 24").r, 0.0);
        assert_eq!(t.test_output(0, "Answer: 4 + 5 + 6 + 10 = 24").r, 0.0);
        assert_eq!(t.test_output(0, "").r, 0.0);
        assert_eq!(t.test_output(0, "Answer: (4 + 5 = 24").r, 0.0);
        assert_eq!(t.test_output(7, "Answer: 24").r, 0.0);
    }

    #[test]
    fn is_terminal_on_answer_line() {
        let t = task();
        assert!(t.is_terminal("a (left: 24)\nAnswer: (1 + 1) * ... = 24"));
        assert!(!t.is_terminal("4 + 6 = 10 (left: 5 10 10)"));
        assert!(!t.is_terminal(""));
    }
}
