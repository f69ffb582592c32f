use tracing::debug;

use crate::errors::SwapError;
use crate::types::{Exchange, Token, TradablePair};

/// Finds a tradable route between two assets across the broker's venues.
///
/// Resolution order: a single venue trading exactly the requested pair, then
/// a pair of venues sharing exactly one intermediate asset. Among multiple
/// 2-hop candidates the first match wins; selection is deterministic over the
/// venue listing order, not rate-maximizing.
pub struct RouteResolver;

impl RouteResolver {
    pub fn resolve(
        source: &Token,
        dest: &Token,
        exchanges: &[Exchange],
    ) -> Result<TradablePair, SwapError> {
        if source.address == dest.address {
            return Err(SwapError::NoRouteFound {
                source_token: source.symbol.clone(),
                dest: dest.symbol.clone(),
            });
        }

        // 1-hop: a venue trading the pair in either order
        if let Some(direct) = exchanges
            .iter()
            .find(|e| e.is_pair(source.address, dest.address))
        {
            debug!(exchange = %direct.id, "direct route found");
            return Ok(TradablePair {
                source: source.clone(),
                dest: dest.clone(),
                path: vec![direct.clone()],
            });
        }

        // 2-hop: e1 touches the source, e2 touches the dest, and they share
        // exactly one other asset that is neither endpoint
        for e1 in exchanges.iter().filter(|e| e.has_asset(source.address)) {
            let intermediate = match e1.other_asset(source.address) {
                Some(t) => t,
                None => continue,
            };
            if intermediate.address == dest.address {
                continue;
            }
            for e2 in exchanges.iter().filter(|e| e.has_asset(dest.address)) {
                if e1.id == e2.id {
                    continue;
                }
                let shared = match e2.other_asset(dest.address) {
                    Some(t) => t,
                    None => continue,
                };
                if shared.address == intermediate.address
                    && shared.address != source.address
                {
                    debug!(
                        first = %e1.id,
                        second = %e2.id,
                        via = %intermediate.symbol,
                        "2-hop route found"
                    );
                    return Ok(TradablePair {
                        source: source.clone(),
                        dest: dest.clone(),
                        path: vec![e1.clone(), e2.clone()],
                    });
                }
            }
        }

        Err(SwapError::NoRouteFound {
            source_token: source.symbol.clone(),
            dest: dest.symbol.clone(),
        })
    }
}
