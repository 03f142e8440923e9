// Copyright (C) 2025 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//
use std::{
    error::Error,
    io::{BufRead, Write},
};

/// Asks the operator to pick one of `names` by number. Invalid answers re-prompt;
/// running out of input is an error. Returns the chosen index.
pub fn select_device<R: BufRead, W: Write>(
    names: &[String],
    mut input: R,
    mut output: W,
) -> Result<usize, Box<dyn Error>> {
    if names.is_empty() {
        return Err("no output devices found".into());
    }

    writeln!(output, "\n--- Available Audio Output Devices ---")?;
    for (i, name) in names.iter().enumerate() {
        writeln!(output, "[{}] {}", i, name)?;
    }

    let mut line = String::new();
    loop {
        write!(output, "\nEnter the number of the device you want to use: ")?;
        output.flush()?;

        line.clear();
        if input.read_line(&mut line)? == 0 {
            return Err("no output device selected".into());
        }

        match line.trim().parse::<usize>() {
            Ok(choice) if choice < names.len() => {
                writeln!(output, "\nOutput device set to: {}", names[choice])?;
                return Ok(choice);
            }
            Ok(_) => writeln!(
                output,
                "Please enter a number between 0 and {}.",
                names.len() - 1
            )?,
            Err(_) => writeln!(output, "Invalid input. Please enter a numeric value.")?,
        }
    }
}
