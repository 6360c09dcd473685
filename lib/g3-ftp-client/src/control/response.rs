/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::str::FromStr;

use g3_text_proto::reply::Reply;

fn enclosed_text(line: &str) -> Option<&str> {
    let p_start = memchr::memchr(b'(', line.as_bytes())?;
    let p_end = memchr::memchr(b')', &line.as_bytes()[p_start..])? + p_start;
    Some(&line[p_start + 1..p_end])
}

/// Parse `227 Entering Passive Mode (h1,h2,h3,h4,p1,p2)`.
pub(super) fn parse_pasv_227_reply(reply: &Reply) -> Option<SocketAddr> {
    if reply.is_multi_line() {
        return None;
    }

    let a: Vec<&str> = enclosed_text(reply.message())?.split(',').collect();
    if a.len() != 6 {
        return None;
    }

    let h1 = u8::from_str(a[0].trim()).ok()?;
    let h2 = u8::from_str(a[1].trim()).ok()?;
    let h3 = u8::from_str(a[2].trim()).ok()?;
    let h4 = u8::from_str(a[3].trim()).ok()?;
    let p1 = u8::from_str(a[4].trim()).ok()?;
    let p2 = u8::from_str(a[5].trim()).ok()?;

    let ip = IpAddr::V4(Ipv4Addr::new(h1, h2, h3, h4));
    let port = ((p1 as u16) << 8) + (p2 as u16);
    Some(SocketAddr::new(ip, port))
}

/// Parse `229 Entering Extended Passive Mode (|||port|)`.
pub(super) fn parse_epsv_229_reply(reply: &Reply) -> Option<u16> {
    if reply.is_multi_line() {
        return None;
    }

    let s = enclosed_text(reply.message())?;
    let port = s.strip_prefix("|||")?.strip_suffix('|')?;
    u16::from_str(port).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use g3_text_proto::reply::{ReplyParser, ReplySyntax};

    fn single_reply(line: &str) -> Reply {
        let mut parser = ReplyParser::new(ReplySyntax::FTP, false);
        parser.feed_line(line.as_bytes()).unwrap().unwrap()
    }

    #[test]
    fn pasv() {
        let reply = single_reply("227 Entering Passive Mode (192,168,1,2,19,137).");
        assert_eq!(
            parse_pasv_227_reply(&reply),
            Some(SocketAddr::from_str("192.168.1.2:5001").unwrap())
        );

        let reply = single_reply("227 Entering Passive Mode (192,168,1,2,19)");
        assert!(parse_pasv_227_reply(&reply).is_none());

        let reply = single_reply("227 Entering Passive Mode (192,168,1,256,19,137)");
        assert!(parse_pasv_227_reply(&reply).is_none());

        let reply = single_reply("227 Entering Passive Mode");
        assert!(parse_pasv_227_reply(&reply).is_none());
    }

    #[test]
    fn epsv() {
        let reply = single_reply("229 Entering Extended Passive Mode (|||6446|)");
        assert_eq!(parse_epsv_229_reply(&reply), Some(6446));

        let reply = single_reply("229 Entering Extended Passive Mode (|||)");
        assert!(parse_epsv_229_reply(&reply).is_none());

        let reply = single_reply("229 Entering Extended Passive Mode (||6446|)");
        assert!(parse_epsv_229_reply(&reply).is_none());
    }
}
