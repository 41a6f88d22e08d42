//! Calculator step server.
//!
//! Start it with `cargo run --example calculator -- -v`, then run a wire
//! protocol capable Cucumber runner against `demos/features`.

use cuke_wire::{cli, step::Dispatch, Failure, Registry, Table};

#[derive(Debug, Default)]
struct Calculator {
    digits: Vec<f64>,
    result: f64,
}

impl Calculator {
    fn press(&mut self, operation: &str) -> Result<(), Failure> {
        let &[a, b] = self.digits.as_slice() else {
            return Err(Failure::new(format!(
                "`{operation}` needs exactly two numbers, got {:?}",
                self.digits,
            )));
        };
        self.result = match operation {
            "add" | "加法" => a + b,
            "subtract" | "减法" => a - b,
            "multiply" | "乘法" => a * b,
            "divide" | "除法" => a / b,
            _ => return Err(Failure::new(format!("unknown operation `{operation}`"))),
        };
        Ok(())
    }

    fn check(&self, expected: f64) -> Result<(), Failure> {
        if (self.result - expected).abs() > f64::EPSILON {
            return Err(Failure::new(format!(
                "expected {expected} on the screen, got {}",
                self.result,
            )));
        }
        Ok(())
    }
}

fn steps() -> anyhow::Result<Registry> {
    let mut steps = Registry::new();

    steps.given(
        r"I have entered ([\d\.]+) into the calculator",
        Dispatch::with_context(|calc: &mut Calculator, n: f64| {
            calc.digits.push(n);
        }),
    )?;
    steps.given(
        "I have entered the following numbers:",
        Dispatch::with_context_and_table(
            |calc: &mut Calculator, table: &Table| -> anyhow::Result<()> {
                for row in table.rows() {
                    let cell = row.first().map_or("", String::as_str);
                    calc.digits.push(cell.parse()?);
                }
                Ok(())
            },
        ),
    )?;
    steps.when(
        r"I press (\w+)",
        Dispatch::with_context(|calc: &mut Calculator, op: String| {
            if op == "add" {
                // Sums any amount of numbers, not just two.
                calc.result = calc.digits.iter().sum();
                return Ok(());
            }
            calc.press(&op)
        }),
    )?;
    steps.then(
        r"the result should be ([\d\.]+) on the screen",
        Dispatch::with_context(|calc: &mut Calculator, expected: f64| {
            calc.check(expected)
        }),
    )?;

    steps.given(
        r"我在计算器中输入了 ([\d\.]+)",
        Dispatch::with_context(|calc: &mut Calculator, n: f64| {
            calc.digits.push(n);
        }),
    )?;
    steps.when(
        "我按(.+)",
        Dispatch::with_context(|calc: &mut Calculator, op: String| {
            calc.press(&op)
        }),
    )?;
    steps.then(
        r"屏幕上的结果应该是 ([\d\.]+)",
        Dispatch::with_context(|calc: &mut Calculator, expected: f64| {
            calc.check(expected)
        }),
    )?;

    Ok(steps)
}

fn main() -> anyhow::Result<()> {
    let opts = cli::Opts::parsed();
    opts.init_tracing();

    let steps = steps()?;
    for step in &steps {
        tracing::debug!(%step, "registered");
    }
    opts.serve(&steps)?;
    Ok(())
}
