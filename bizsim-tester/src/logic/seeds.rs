use anyhow::{Context, Result, bail};
use clap::ValueEnum;

use super::GameplayStrategy;

pub fn split_csv(s: &str) -> Vec<String> {
    s.split(',')
        .map(|x| x.trim().to_string())
        .filter(|x| !x.is_empty())
        .collect()
}

/// Resolve CLI seed tokens. Negative values map to their magnitude.
pub fn parse_seeds(tokens: &[String]) -> Result<Vec<u64>> {
    let mut seeds = Vec::new();
    for token in tokens {
        let seed = if let Ok(value) = token.parse::<u64>() {
            value
        } else {
            token
                .parse::<i64>()
                .map(i64::unsigned_abs)
                .with_context(|| format!("invalid seed `{token}`"))?
        };
        if !seeds.contains(&seed) {
            seeds.push(seed);
        }
    }
    if seeds.is_empty() {
        bail!("no seeds given");
    }
    Ok(seeds)
}

/// Resolve strategy names; `all` expands to every built-in strategy.
pub fn parse_strategies(tokens: &[String]) -> Result<Vec<GameplayStrategy>> {
    let mut strategies = Vec::new();
    for token in tokens {
        if token.eq_ignore_ascii_case("all") {
            for strategy in GameplayStrategy::ALL {
                if !strategies.contains(&strategy) {
                    strategies.push(strategy);
                }
            }
            continue;
        }
        let strategy = GameplayStrategy::from_str(token, true)
            .map_err(|err| anyhow::anyhow!("unknown strategy `{token}`: {err}"))?;
        if !strategies.contains(&strategy) {
            strategies.push(strategy);
        }
    }
    if strategies.is_empty() {
        bail!("no strategies given");
    }
    Ok(strategies)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_csv_trims_and_filters() {
        let parts = split_csv(" alpha, ,beta,  gamma ");
        assert_eq!(parts, vec!["alpha", "beta", "gamma"]);
    }

    #[test]
    fn seeds_accept_negative_and_dedupe() {
        let seeds = parse_seeds(&split_csv("7,-7,42")).unwrap();
        assert_eq!(seeds, vec![7, 42]);
        assert!(parse_seeds(&split_csv("seven")).is_err());
        assert!(parse_seeds(&[]).is_err());
    }

    #[test]
    fn strategies_expand_all() {
        let strategies = parse_strategies(&split_csv("balanced,all")).unwrap();
        assert_eq!(strategies.len(), 4);
        assert_eq!(strategies[0], GameplayStrategy::Balanced);
        assert!(parse_strategies(&split_csv("reckless")).is_err());
    }
}
