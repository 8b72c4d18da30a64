use std::io;
use std::io::Write;
use rpassword::read_password;

const CHOICE_PROMPT: &str = "Enter a number:";
const CHOICES_PROMPT: &str = "Enter numbers separated by commas:";
const INVALID_CHOICE: &str = "Invalid choice";

pub fn input(prompt: &str) -> io::Result<String> {
    println!("{}", prompt);
    io::stdout().flush()?; // 确保提示符立即输出

    let mut input = String::new();
    if io::stdin().read_line(&mut input)? == 0 {
        return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "stdin closed"));
    }
    Ok(input.trim().to_string())
}

/// Empty answer keeps `default`.
pub fn input_with_default(prompt: &str, default: &str) -> io::Result<String> {
    let answer = if default.is_empty() {
        input(prompt)?
    } else {
        input(&format!("{} [{}]", prompt, default))?
    };
    Ok(if answer.is_empty() { default.to_string() } else { answer })
}

pub fn input_password(prompt: &str) -> io::Result<String> {
    println!("{}", prompt);
    read_password()
}

pub fn input_password_trim(prompt: &str) -> io::Result<String> {
    Ok(input_password(prompt)?.trim().to_string())
}

pub fn confirm(prompt: &str) -> io::Result<bool> {
    let answer = input(&format!("{} (y/N)", prompt))?;
    Ok(matches!(answer.to_ascii_lowercase().as_str(), "y" | "yes"))
}

/// Parses a 1-based choice; `None` for anything out of range.
pub fn parse_choice(answer: &str, len: usize) -> Option<usize> {
    answer
        .trim()
        .parse::<usize>()
        .ok()
        .filter(|n| (1..=len).contains(n))
        .map(|n| n - 1)
}

/// Parses `1,3` style answers into indices, keeping entry order and dropping
/// repeats.
pub fn parse_choices(answer: &str, len: usize) -> Option<Vec<usize>> {
    let mut picked = Vec::new();
    for part in answer.split([',', ' ']).filter(|p| !p.trim().is_empty()) {
        let index = parse_choice(part, len)?;
        if !picked.contains(&index) {
            picked.push(index);
        }
    }
    Some(picked)
}

/// Numbered menu. Empty answer picks `default` when given.
pub fn choose<T: AsRef<str>>(prompt: &str, options: &[T], default: Option<usize>) -> io::Result<usize> {
    loop {
        println!("{}", prompt);
        for (i, option) in options.iter().enumerate() {
            let marker = if Some(i) == default { "*" } else { " " };
            println!(" {}{}) {}", marker, i + 1, option.as_ref());
        }
        let answer = input(CHOICE_PROMPT)?;
        if answer.is_empty() {
            if let Some(default) = default {
                return Ok(default);
            }
        }
        match parse_choice(&answer, options.len()) {
            Some(index) => return Ok(index),
            None => println!("{}", INVALID_CHOICE),
        }
    }
}

/// Comma separated multi-select. Empty answer keeps `default`.
pub fn choose_many<T: AsRef<str>>(prompt: &str, options: &[T], default: &[usize]) -> io::Result<Vec<usize>> {
    loop {
        println!("{}", prompt);
        for (i, option) in options.iter().enumerate() {
            let marker = if default.contains(&i) { "*" } else { " " };
            println!(" {}{}) {}", marker, i + 1, option.as_ref());
        }
        let answer = input(CHOICES_PROMPT)?;
        if answer.is_empty() {
            return Ok(default.to_vec());
        }
        match parse_choices(&answer, options.len()) {
            Some(indices) => return Ok(indices),
            None => println!("{}", INVALID_CHOICE),
        }
    }
}
