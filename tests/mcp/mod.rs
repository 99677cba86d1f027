mod harness;
mod protocol_test;
mod workflow_tools_test;
