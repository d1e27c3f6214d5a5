//! Numeric reply codes.
//!
//! Codes are an external contract and are rendered as zero-padded
//! three-digit strings.

#![allow(non_camel_case_types)]

use std::fmt::{self, Display, Formatter};

/// Server numeric reply.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u16)]
#[non_exhaustive]
pub enum Response {
    // === Registration ===
    /// 001
    RPL_WELCOME = 1,
    /// 002
    RPL_YOURHOST = 2,
    /// 003
    RPL_CREATED = 3,
    /// 004
    RPL_MYINFO = 4,

    // === Command replies ===
    /// 212 - per-command usage for STATS m
    RPL_STATSCOMMANDS = 212,
    /// 219
    RPL_ENDOFSTATS = 219,
    /// 311
    RPL_WHOISUSER = 311,
    /// 312
    RPL_WHOISSERVER = 312,
    /// 313
    RPL_WHOISOPERATOR = 313,
    /// 318
    RPL_ENDOFWHOIS = 318,
    /// 319
    RPL_WHOISCHANNELS = 319,
    /// 321
    RPL_LISTSTART = 321,
    /// 322
    RPL_LIST = 322,
    /// 323
    RPL_LISTEND = 323,
    /// 324
    RPL_CHANNELMODEIS = 324,
    /// 331
    RPL_NOTOPIC = 331,
    /// 332
    RPL_TOPIC = 332,
    /// 333
    RPL_TOPICWHOTIME = 333,
    /// 341
    RPL_INVITING = 341,
    /// 351
    RPL_VERSION = 351,
    /// 353
    RPL_NAMREPLY = 353,
    /// 366
    RPL_ENDOFNAMES = 366,
    /// 371
    RPL_INFO = 371,
    /// 372
    RPL_MOTD = 372,
    /// 374
    RPL_ENDOFINFO = 374,
    /// 375
    RPL_MOTDSTART = 375,
    /// 376
    RPL_ENDOFMOTD = 376,
    /// 381
    RPL_YOUREOPER = 381,
    /// 391
    RPL_TIME = 391,

    // === Errors ===
    /// 401
    ERR_NOSUCHNICK = 401,
    /// 403
    ERR_NOSUCHCHANNEL = 403,
    /// 404
    ERR_CANNOTSENDTOCHAN = 404,
    /// 405
    ERR_TOOMANYCHANNELS = 405,
    /// 409
    ERR_NOORIGIN = 409,
    /// 411
    ERR_NORECIPIENT = 411,
    /// 412
    ERR_NOTEXTTOSEND = 412,
    /// 421
    ERR_UNKNOWNCOMMAND = 421,
    /// 422
    ERR_NOMOTD = 422,
    /// 431
    ERR_NONICKNAMEGIVEN = 431,
    /// 432
    ERR_ERRONEUSNICKNAME = 432,
    /// 433
    ERR_NICKNAMEINUSE = 433,
    /// 441
    ERR_USERNOTINCHANNEL = 441,
    /// 442
    ERR_NOTONCHANNEL = 442,
    /// 443
    ERR_USERONCHANNEL = 443,
    /// 451
    ERR_NOTREGISTERED = 451,
    /// 461
    ERR_NEEDMOREPARAMS = 461,
    /// 462
    ERR_ALREADYREGISTRED = 462,
    /// 464
    ERR_PASSWDMISMATCH = 464,
    /// 471
    ERR_CHANNELISFULL = 471,
    /// 472
    ERR_UNKNOWNMODE = 472,
    /// 475
    ERR_BADCHANNELKEY = 475,
    /// 482
    ERR_CHANOPRIVSNEEDED = 482,
}

impl Response {
    /// Numeric value.
    #[inline]
    pub fn code(&self) -> u16 {
        *self as u16
    }

    /// True for the 4xx/5xx error range.
    #[inline]
    pub fn is_error(&self) -> bool {
        (400..600).contains(&self.code())
    }
}

impl Display for Response {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{:03}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_three_digits() {
        assert_eq!(Response::RPL_WELCOME.to_string(), "001");
        assert_eq!(Response::RPL_NAMREPLY.to_string(), "353");
        assert_eq!(Response::ERR_NICKNAMEINUSE.to_string(), "433");
    }

    #[test]
    fn classifies_errors() {
        assert!(Response::ERR_CHANNELISFULL.is_error());
        assert!(!Response::RPL_ENDOFNAMES.is_error());
    }
}
