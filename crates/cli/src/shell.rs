use anyhow::Result;
use engine::{Dict, List, StoreError};
use std::fmt::Write as _;

/// What the REPL should do after a command.
#[derive(Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Print the text and keep reading.
    Reply(String),
    /// Close the containers and stop.
    Exit,
}

/// A string dictionary and a string list driven by text commands.
pub struct Shell {
    pub dict: Dict<String, String>,
    pub list: List<String>,
}

fn reply(s: impl Into<String>) -> Result<Outcome> {
    Ok(Outcome::Reply(s.into()))
}

fn parse_index(raw: Option<&str>) -> Option<u64> {
    raw.and_then(|s| s.parse().ok())
}

impl Shell {
    pub fn new(dict: Dict<String, String>, list: List<String>) -> Self {
        Self { dict, list }
    }

    /// Executes one input line. Store errors that only concern the request
    /// (missing key, bad index) become `ERR` replies; anything else is
    /// returned as an error.
    pub fn execute(&mut self, line: &str) -> Result<Outcome> {
        let mut parts = line.split_whitespace();
        let Some(cmd) = parts.next() else {
            return reply("");
        };

        match cmd.to_uppercase().as_str() {
            "SET" => {
                let Some(k) = parts.next() else {
                    return reply("ERR usage: SET key value");
                };
                let v = parts.collect::<Vec<&str>>().join(" ");
                if v.is_empty() {
                    return reply("ERR usage: SET key value");
                }
                self.dict.set(k.to_string(), v)?;
                reply("OK")
            }
            "GET" => match parts.next() {
                Some(k) => match self.dict.try_get(&k.to_string())? {
                    Some(v) => reply(v),
                    None => reply("(nil)"),
                },
                None => reply("ERR usage: GET key"),
            },
            "DEL" => match parts.next() {
                Some(k) => match self.dict.remove(&k.to_string()) {
                    Ok(_) => reply("OK"),
                    Err(e) if e.is_not_found() => reply("(nil)"),
                    Err(e) => Err(e.into()),
                },
                None => reply("ERR usage: DEL key"),
            },
            "HAS" => match parts.next() {
                Some(k) => reply(if self.dict.contains(&k.to_string())? {
                    "true"
                } else {
                    "false"
                }),
                None => reply("ERR usage: HAS key"),
            },
            "LEN" => reply(self.dict.len().to_string()),
            "KEYS" => {
                let mut keys = self.dict.keys().collect::<Result<Vec<_>, StoreError>>()?;
                keys.sort();
                let mut out = String::new();
                for k in &keys {
                    let _ = writeln!(out, "{k}");
                }
                let _ = write!(out, "({} keys)", keys.len());
                reply(out)
            }
            "PUSH" => {
                let v = parts.collect::<Vec<&str>>().join(" ");
                if v.is_empty() {
                    return reply("ERR usage: PUSH value");
                }
                self.list.push(v)?;
                reply(format!("OK ({})", self.list.len()))
            }
            "LGET" => match parse_index(parts.next()) {
                Some(i) => match self.list.get(i) {
                    Ok(v) => reply(v),
                    Err(e) if e.is_not_found() => reply(format!("ERR {e}")),
                    Err(e) => Err(e.into()),
                },
                None => reply("ERR usage: LGET index"),
            },
            "LSET" => {
                let Some(i) = parse_index(parts.next()) else {
                    return reply("ERR usage: LSET index value");
                };
                let v = parts.collect::<Vec<&str>>().join(" ");
                if v.is_empty() {
                    return reply("ERR usage: LSET index value");
                }
                match self.list.set(i, v) {
                    Ok(_) => reply("OK"),
                    Err(e) if e.is_not_found() => reply(format!("ERR {e}")),
                    Err(e) => Err(e.into()),
                }
            }
            "POP" => match self.list.pop()? {
                Some(v) => reply(v),
                None => reply("(nil)"),
            },
            "LLEN" => reply(self.list.len().to_string()),
            "FLUSH" => {
                self.dict.flush()?;
                self.list.flush()?;
                reply("OK")
            }
            "STATS" => reply(format!(
                "{}\n{}\n{:?}\n{:?}",
                self.dict,
                self.list,
                self.dict.store(),
                self.list.store()
            )),
            "EXIT" | "QUIT" => Ok(Outcome::Exit),
            other => reply(format!("unknown command: {other}")),
        }
    }

    /// Writes both containers out.
    pub fn close(&mut self) -> Result<()> {
        self.dict.close()?;
        self.list.close()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::StoreConfig;

    fn shell(dir: &std::path::Path) -> Shell {
        let cfg = |name: &str| {
            StoreConfig::new(name)
                .location(dir)
                .page_capacity(2)
                .max_resident_pages(1)
        };
        Shell::new(
            Dict::open(cfg("kv")).unwrap(),
            List::open(cfg("items")).unwrap(),
        )
    }

    fn text(outcome: Outcome) -> String {
        match outcome {
            Outcome::Reply(s) => s,
            Outcome::Exit => panic!("unexpected exit"),
        }
    }

    #[test]
    fn dictionary_commands() {
        let dir = tempfile::tempdir().unwrap();
        let mut sh = shell(dir.path());

        assert_eq!(text(sh.execute("SET name Ada Lovelace").unwrap()), "OK");
        assert_eq!(text(sh.execute("get name").unwrap()), "Ada Lovelace");
        assert_eq!(text(sh.execute("HAS name").unwrap()), "true");
        assert_eq!(text(sh.execute("LEN").unwrap()), "1");
        assert_eq!(text(sh.execute("DEL name").unwrap()), "OK");
        assert_eq!(text(sh.execute("DEL name").unwrap()), "(nil)");
        assert_eq!(text(sh.execute("GET name").unwrap()), "(nil)");
        assert_eq!(text(sh.execute("SET lonely").unwrap()), "ERR usage: SET key value");
    }

    #[test]
    fn list_commands() {
        let dir = tempfile::tempdir().unwrap();
        let mut sh = shell(dir.path());

        for v in ["a", "b", "c"] {
            sh.execute(&format!("PUSH {v}")).unwrap();
        }
        assert_eq!(text(sh.execute("LLEN").unwrap()), "3");
        assert_eq!(text(sh.execute("LGET 1").unwrap()), "b");
        assert_eq!(text(sh.execute("LSET 1 B").unwrap()), "OK");
        assert_eq!(text(sh.execute("LGET 1").unwrap()), "B");
        assert_eq!(
            text(sh.execute("LGET 9").unwrap()),
            "ERR index 9 out of range for length 3"
        );
        assert_eq!(text(sh.execute("POP").unwrap()), "c");
        assert_eq!(text(sh.execute("LLEN").unwrap()), "2");
    }

    #[test]
    fn exit_and_unknown() {
        let dir = tempfile::tempdir().unwrap();
        let mut sh = shell(dir.path());
        assert_eq!(sh.execute("QUIT").unwrap(), Outcome::Exit);
        assert_eq!(text(sh.execute("FROB").unwrap()), "unknown command: FROB");
        sh.close().unwrap();
    }
}
