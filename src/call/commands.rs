use super::context::CallContext;
use crate::protocol::{decode_dtmf, AgiError, AgiResponse, Command, DigitList, VerboseLevel};
use std::fmt::Display;
use std::time::{SystemTime, UNIX_EPOCH};

fn now_unix() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_secs())
}

/// Commands built on [`CallContext::send`].
///
/// When `raise_on_error` is off and the backend reports a failure, the
/// decoding commands skip the failure payload and report "no digit", an
/// empty value or an unset variable.
impl CallContext {
    fn send_dtmf(&mut self, command: Command) -> Result<Option<char>, AgiError> {
        let response = self.send(command.as_str())?;
        if response.error.is_some() {
            return Ok(None);
        }
        decode_dtmf(&response.result.0)
    }

    /// Answer the channel.
    ///
    /// # Errors
    ///
    /// See [`CallContext::send`].
    pub fn answer(&mut self) -> Result<AgiResponse, AgiError> {
        self.send("ANSWER")
    }

    /// Hang up the channel.
    ///
    /// # Errors
    ///
    /// See [`CallContext::send`].
    pub fn hangup(&mut self) -> Result<AgiResponse, AgiError> {
        self.send("HANGUP")
    }

    /// Run a dialplan application.
    ///
    /// # Errors
    ///
    /// See [`CallContext::send`].
    pub fn exec(&mut self, application: &str, options: Option<&str>) -> Result<AgiResponse, AgiError> {
        let mut cmd = Command::new("EXEC").raw(application);
        if let Some(options) = options {
            cmd = cmd.quoted(options);
        }
        self.send(cmd.as_str())
    }

    /// Write a message to the backend's verbose log.
    ///
    /// # Errors
    ///
    /// See [`CallContext::send`].
    pub fn verbose(&mut self, message: &str, level: VerboseLevel) -> Result<AgiResponse, AgiError> {
        self.send(Command::new("VERBOSE").quoted(message).quoted(level).as_str())
    }

    /// # Errors
    ///
    /// See [`CallContext::send`].
    pub fn start_music_on_hold(&mut self, music_class: Option<&str>) -> Result<AgiResponse, AgiError> {
        self.exec("StartMusicOnHold", music_class)
    }

    /// # Errors
    ///
    /// See [`CallContext::send`].
    pub fn stop_music_on_hold(&mut self) -> Result<AgiResponse, AgiError> {
        self.exec("StopMusicOnHold", None)
    }

    /// Wait up to `timeout_ms` for a keypress; `-1` waits forever.
    ///
    /// # Errors
    ///
    /// See [`CallContext::send`]; [`AgiError::Value`] for an undecodable digit.
    pub fn wait_for_digit(&mut self, timeout_ms: i64) -> Result<Option<char>, AgiError> {
        self.send_dtmf(Command::new("WAIT FOR DIGIT").quoted(timeout_ms))
    }

    /// Speak a digit sequence, interruptible by any of `escape_digits`.
    ///
    /// # Errors
    ///
    /// See [`CallContext::send`]; [`AgiError::Value`] for an undecodable digit.
    pub fn say_digits<D, E>(&mut self, digits: &D, escape_digits: &E) -> Result<Option<char>, AgiError>
    where
        D: DigitList + ?Sized,
        E: DigitList + ?Sized,
    {
        self.send_dtmf(Command::new("SAY DIGITS").digits(digits).digits(escape_digits))
    }

    /// # Errors
    ///
    /// See [`CallContext::send`]; [`AgiError::Value`] for an undecodable digit.
    pub fn say_number<E>(&mut self, number: impl Display, escape_digits: &E) -> Result<Option<char>, AgiError>
    where
        E: DigitList + ?Sized,
    {
        self.send_dtmf(Command::new("SAY NUMBER").quoted(number).digits(escape_digits))
    }

    /// Spell out `text` character by character.
    ///
    /// # Errors
    ///
    /// See [`CallContext::send`]; [`AgiError::Value`] for an undecodable digit.
    pub fn say_alpha<E>(&mut self, text: &str, escape_digits: &E) -> Result<Option<char>, AgiError>
    where
        E: DigitList + ?Sized,
    {
        self.send_dtmf(Command::new("SAY ALPHA").quoted(text).digits(escape_digits))
    }

    /// # Errors
    ///
    /// See [`CallContext::send`]; [`AgiError::Value`] for an undecodable digit.
    pub fn say_phonetic<E>(&mut self, text: &str, escape_digits: &E) -> Result<Option<char>, AgiError>
    where
        E: DigitList + ?Sized,
    {
        self.send_dtmf(Command::new("SAY PHONETIC").quoted(text).digits(escape_digits))
    }

    /// Speak the date of a Unix timestamp; `None` means now.
    ///
    /// # Errors
    ///
    /// See [`CallContext::send`]; [`AgiError::Value`] for an undecodable digit.
    pub fn say_date<E>(&mut self, seconds: Option<u64>, escape_digits: &E) -> Result<Option<char>, AgiError>
    where
        E: DigitList + ?Sized,
    {
        let seconds = seconds.unwrap_or_else(now_unix);
        self.send_dtmf(Command::new("SAY DATE").quoted(seconds).digits(escape_digits))
    }

    /// Speak the time of a Unix timestamp; `None` means now.
    ///
    /// # Errors
    ///
    /// See [`CallContext::send`]; [`AgiError::Value`] for an undecodable digit.
    pub fn say_time<E>(&mut self, seconds: Option<u64>, escape_digits: &E) -> Result<Option<char>, AgiError>
    where
        E: DigitList + ?Sized,
    {
        let seconds = seconds.unwrap_or_else(now_unix);
        self.send_dtmf(Command::new("SAY TIME").quoted(seconds).digits(escape_digits))
    }

    /// Speak date and time of a Unix timestamp; `None` means now.
    ///
    /// `format` and `timezone` are only sent when given; a timezone needs a
    /// format before it.
    ///
    /// # Errors
    ///
    /// See [`CallContext::send`]; [`AgiError::Value`] for an undecodable digit.
    pub fn say_datetime<E>(
        &mut self,
        seconds: Option<u64>,
        escape_digits: &E,
        format: Option<&str>,
        timezone: Option<&str>,
    ) -> Result<Option<char>, AgiError>
    where
        E: DigitList + ?Sized,
    {
        let seconds = seconds.unwrap_or_else(now_unix);
        let mut cmd = Command::new("SAY DATETIME")
            .quoted(seconds)
            .digits(escape_digits);
        if format.is_some() || timezone.is_some() {
            cmd = cmd.quoted(format.unwrap_or_default());
        }
        if let Some(tz) = timezone {
            cmd = cmd.quoted(tz);
        }
        self.send_dtmf(cmd)
    }

    /// Play a sound file, interruptible by any of `escape_digits`.
    ///
    /// `filename` has no extension. Playback starts `sample_offset` samples in.
    ///
    /// # Errors
    ///
    /// See [`CallContext::send`]; [`AgiError::Value`] for an undecodable digit.
    pub fn stream_file<E>(
        &mut self,
        filename: &str,
        escape_digits: &E,
        sample_offset: u64,
    ) -> Result<Option<char>, AgiError>
    where
        E: DigitList + ?Sized,
    {
        self.send_dtmf(
            Command::new("STREAM FILE")
                .quoted(filename)
                .digits(escape_digits)
                .quoted(sample_offset),
        )
    }

    /// Like [`CallContext::stream_file`], then wait `timeout_ms` for a key.
    ///
    /// # Errors
    ///
    /// See [`CallContext::send`]; [`AgiError::Value`] for an undecodable digit.
    pub fn get_option<E>(
        &mut self,
        filename: &str,
        escape_digits: &E,
        timeout_ms: u64,
    ) -> Result<Option<char>, AgiError>
    where
        E: DigitList + ?Sized,
    {
        self.send_dtmf(
            Command::new("GET OPTION")
                .quoted(filename)
                .digits(escape_digits)
                .quoted(timeout_ms),
        )
    }

    /// Play `filename` and collect up to `max_digits` keypresses.
    ///
    /// Returns the collected digits and whether collection ended on timeout.
    ///
    /// # Errors
    ///
    /// See [`CallContext::send`].
    pub fn get_data(
        &mut self,
        filename: &str,
        timeout_ms: u64,
        max_digits: u32,
    ) -> Result<(String, bool), AgiError> {
        let response = self.send(
            Command::new("GET DATA")
                .quoted(filename)
                .quoted(timeout_ms)
                .quoted(max_digits)
                .as_str(),
        )?;
        if response.error.is_some() {
            return Ok((String::new(), false));
        }
        let timed_out = response.timed_out();
        Ok((response.result.0, timed_out))
    }

    /// Read a channel variable. `None` when it is not set, which is distinct
    /// from a variable set to the empty string.
    ///
    /// # Errors
    ///
    /// See [`CallContext::send`].
    pub fn get_variable(&mut self, name: &str) -> Result<Option<String>, AgiError> {
        let response = self.send(Command::new("GET VARIABLE").quoted(name).as_str())?;
        if response.error.is_some() {
            return Ok(None);
        }
        let (code, value) = response.result;
        Ok((code == "1").then_some(value))
    }

    /// # Errors
    ///
    /// See [`CallContext::send`].
    pub fn set_variable(&mut self, name: &str, value: &str) -> Result<AgiResponse, AgiError> {
        self.send(Command::new("SET VARIABLE").quoted(name).quoted(value).as_str())
    }
}

#[cfg(test)]
mod tests {
    use crate::call::testing::{context, sent_lines};
    use crate::protocol::{AgiError, VerboseLevel};

    #[test]
    fn test_verbose_and_answer_lines() {
        let (mut ctx, out) = context("200 result=1\n200 result=0\n");
        ctx.verbose("hello world", VerboseLevel::Info).unwrap();
        ctx.answer().unwrap();
        assert_eq!(
            sent_lines(&out),
            vec![r#"VERBOSE "hello world" "1""#, "ANSWER"]
        );
    }

    #[test]
    fn test_exec_with_and_without_options() {
        let (mut ctx, out) = context("200 result=0\n200 result=0\n");
        ctx.start_music_on_hold(Some("jazz")).unwrap();
        ctx.stop_music_on_hold().unwrap();
        assert_eq!(
            sent_lines(&out),
            vec![r#"EXEC StartMusicOnHold "jazz""#, "EXEC StopMusicOnHold"]
        );
    }

    #[test]
    fn test_dtmf_commands_decode_digits() {
        let (mut ctx, out) = context("200 result=49\n200 result=0\n200 result=35 endpos=8000\n");
        assert_eq!(ctx.wait_for_digit(-1).unwrap(), Some('1'));
        assert_eq!(ctx.say_digits(&[1, 2, 3], "#").unwrap(), None);
        assert_eq!(ctx.stream_file("welcome", "#*", 0).unwrap(), Some('#'));
        assert_eq!(
            sent_lines(&out),
            vec![
                r#"WAIT FOR DIGIT "-1""#,
                r##"SAY DIGITS "123" "#""##,
                r##"STREAM FILE "welcome" "#*" "0""##,
            ]
        );
    }

    #[test]
    fn test_malformed_dtmf_is_value_error() {
        let (mut ctx, _out) = context("200 result=abc\n");
        let err = ctx.get_option("menu", "12", 2000).unwrap_err();
        assert!(matches!(err, AgiError::Value { ref payload, .. } if payload == "abc"));
    }

    #[test]
    fn test_get_data_timeout_flag() {
        let (mut ctx, out) = context("200 result=12 (timeout)\n200 result=345\n");
        assert_eq!(ctx.get_data("pin", 2000, 4).unwrap(), ("12".to_string(), true));
        assert_eq!(ctx.get_data("pin", 2000, 4).unwrap(), ("345".to_string(), false));
        assert_eq!(sent_lines(&out)[0], r#"GET DATA "pin" "2000" "4""#);
    }

    #[test]
    fn test_get_variable_distinguishes_absent_and_empty() {
        let (mut ctx, out) = context("200 result=1 (alice)\n200 result=0\n200 result=1 ()\n");
        assert_eq!(ctx.get_variable("CALLER").unwrap().as_deref(), Some("alice"));
        assert_eq!(ctx.get_variable("NOPE").unwrap(), None);
        assert_eq!(ctx.get_variable("EMPTY").unwrap().as_deref(), Some(""));
        assert_eq!(sent_lines(&out)[1], r#"GET VARIABLE "NOPE""#);
    }

    #[test]
    fn test_say_datetime_optional_fields() {
        let (mut ctx, out) = context("200 result=0\n200 result=0\n200 result=0\n");
        ctx.say_datetime(Some(0), "", None, None).unwrap();
        ctx.say_datetime(Some(0), "", None, Some("UTC")).unwrap();
        ctx.say_date(None, "").unwrap();
        let lines = sent_lines(&out);
        assert_eq!(lines[0], r#"SAY DATETIME "0" """#);
        assert_eq!(lines[1], r#"SAY DATETIME "0" "" "" "UTC""#);
        assert!(lines[2].starts_with("SAY DATE \""));
        assert_ne!(lines[2], r#"SAY DATE "0" """#);
    }

    #[test]
    fn test_failure_not_raised_decodes_as_no_digit() {
        let (mut ctx, _out) = context("511 Command Not Permitted on a dead channel\n");
        assert_eq!(ctx.say_alpha("abc", "").unwrap(), None);
    }

    #[test]
    fn test_app_error_not_raised_is_no_digit() {
        let (mut ctx, _out) = context("200 result=-1\n200 result=-1 endpos=0\n");
        assert_eq!(ctx.stream_file("welcome", "#", 0).unwrap(), None);
        assert_eq!(ctx.wait_for_digit(1000).unwrap(), None);
    }

    #[test]
    fn test_app_error_not_raised_collects_nothing() {
        let (mut ctx, _out) =
            context("200 result=-1\n200 result=-1 (timeout)\n200 result=1 (hangup)\n");
        assert_eq!(ctx.get_data("pin", 2000, 4).unwrap(), (String::new(), false));
        assert_eq!(ctx.get_data("pin", 2000, 4).unwrap(), (String::new(), false));
        assert_eq!(ctx.get_variable("CALLER").unwrap(), None);
    }

    #[test]
    fn test_app_error_raised_when_configured() {
        let (ctx, _out) = context("200 result=-1\n");
        let mut ctx = ctx.with_raise_on_error(true);
        let err = ctx.stream_file("welcome", "#", 0).unwrap_err();
        assert_eq!(err.failure_kind(), Some(crate::protocol::FailureKind::AppError));
    }

    #[test]
    fn test_set_variable_quotes_value() {
        let (mut ctx, out) = context("200 result=1\n");
        ctx.set_variable("GREETING", r#"say "hi""#).unwrap();
        assert_eq!(sent_lines(&out), vec![r#"SET VARIABLE "GREETING" "say \"hi\"""#]);
    }
}
