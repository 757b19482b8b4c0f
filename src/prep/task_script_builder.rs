use super::TargetOs;

/// Utility for building the contents of a task script file.
/// Note that it modifies a String reference held internally;
/// read that String to get the script's contents.
#[derive(Debug)]
pub struct TaskScriptBuilder<'a> {
    strbuf: &'a mut String,
    os: TargetOs,
}

impl<'a> TaskScriptBuilder<'a> {
    pub fn new(strbuf: &'a mut String, os: TargetOs) -> Self {
        Self { strbuf, os }
    }
}

impl TaskScriptBuilder<'_> {
    /// interpreter line, and cd to the script's own directory
    pub fn write_prefix(&mut self) {
        self.strbuf.clear();
        match self.os {
            TargetOs::Unix => {
                self.write_line("#!/bin/sh");
                self.write_line("BASEDIR=$(cd `dirname $0`; pwd)");
                self.write_line("cd $BASEDIR");
            }
            TargetOs::Windows => {
                self.write_line("@echo off");
                self.write_line("cd /d %~dp0");
            }
        }
    }

    /// load environment variables from a file
    pub fn write_env_file(&mut self, env_file: &str) {
        match self.os {
            TargetOs::Unix => self.strbuf.push_str(". "),
            TargetOs::Windows => self.strbuf.push_str("call "),
        }
        self.write_line(env_file);
    }

    /// the task's command
    pub fn write_command(&mut self, command: &str) {
        self.write_line(command);
    }

    fn write_line(&mut self, line: &str) {
        self.strbuf.push_str(line);
        match self.os {
            TargetOs::Unix => self.strbuf.push('\n'),
            TargetOs::Windows => self.strbuf.push_str("\r\n"),
        }
    }
}
